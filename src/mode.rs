//! Operating mode: the runtime flag that selects the DOM-caching policy and
//! worker count.

use std::num::NonZeroUsize;

use crate::error::PreconditionError;

/// `Memory` (low-memory) never caches parsed DOMs and re-parses during
/// `transform`; `Performance` caches every parsed DOM for reuse during
/// `transform` and is restricted to a single worker by construction (no
/// `workers` field exists on that variant), so the cached-DOM-is-not-
/// cheaply-shareable-across-workers rule can't be violated by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Memory { workers: NonZeroUsize },
    Performance,
}

impl Mode {
    /// Construct a mode from the public `(n_processes, operation_mode)`
    /// configuration surface, validating the "performance forbids workers"
    /// precondition per spec.md §7.
    pub fn new(n_processes: usize, performance: bool) -> Result<Self, PreconditionError> {
        let workers =
            NonZeroUsize::new(n_processes).ok_or(PreconditionError::ZeroWorkers)?;

        if performance {
            if workers.get() > 1 {
                return Err(PreconditionError::PerformanceModeWorkers(n_processes));
            }
            Ok(Mode::Performance)
        } else {
            Ok(Mode::Memory { workers })
        }
    }

    pub fn workers(&self) -> usize {
        match self {
            Mode::Memory { workers } => workers.get(),
            Mode::Performance => 1,
        }
    }

    pub fn caches_dom(&self) -> bool {
        matches!(self, Mode::Performance)
    }
}
