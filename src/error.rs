//! Typed error hierarchy.
//!
//! Per-record failures ([`ParseError`], [`DatasetError`]) are swallowed by
//! callers (logged and skipped); structural failures ([`PreconditionError`],
//! [`WorkerError`]) propagate as [`DeboilerError`].

use std::any::Any;
use std::borrow::Cow;
use std::fmt::Display;
use std::ops::Deref;

/// The HTML parser (or an underlying DOM-mutation call) panicked while
/// processing a page.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("panicked while parsing or walking html")]
    Panic(#[from] PanicMsg),
    #[error("input bytes could not be interpreted as html")]
    Empty,
}

/// A dataset record was malformed or unreadable.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("malformed json on line {line}: {source}")]
    Json {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing field {field:?} on line {line}")]
    MissingField { line: u64, field: &'static str },
    #[error("io error reading dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("record index {0} out of bounds")]
    OutOfBounds(usize),
}

/// `transform` called before `fit`, or invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    #[error("transform() called before fit()")]
    NotFit,
    #[error("performance mode does not support multiple workers (n_processes={0})")]
    PerformanceModeWorkers(usize),
    #[error("n_processes must be at least 1")]
    ZeroWorkers,
    #[error("invalid candidate tag list: {0}")]
    InvalidCandidateTags(String),
}

/// A worker thread died unexpectedly.
#[derive(Debug, thiserror::Error)]
#[error("worker failed: {0}")]
pub struct WorkerError(pub String);

/// Structural/programmer errors that propagate to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DeboilerError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Error wrapper around panic payloads that handles static and formatted messages.
///
/// Mirrors `om-wikiparser::html::PanicMsg`.
#[derive(Debug, PartialEq)]
pub struct PanicMsg(Cow<'static, str>);

impl PanicMsg {
    pub fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            Some(Cow::Borrowed(*s))
        } else {
            payload.downcast::<String>().ok().map(|s| Cow::Owned(*s))
        };

        Self(msg.unwrap_or_default())
    }
}

impl Display for PanicMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PanicMsg {}

impl Deref for PanicMsg {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
