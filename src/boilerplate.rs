//! The accumulator produced by `fit` and consumed by `transform`.

use std::collections::HashSet;

use crate::dom::Signature;

/// `set<Signature>` accumulated during `fit`. Monotonically growing while
/// `fit` runs (only `merge` is exposed); immutable once `fit` returns, which
/// is enforced here by taking `&self` everywhere except `merge`.
#[derive(Debug, Clone, Default)]
pub struct DomainBoilerplate {
    signatures: HashSet<Signature>,
}

impl DomainBoilerplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `other` into this set. The only mutating operation, used only
    /// while `fit` is accumulating across page pairs.
    pub fn merge(&mut self, other: HashSet<Signature>) {
        self.signatures.extend(other);
    }

    pub fn is_boilerplate(&self, signature: &Signature) -> bool {
        self.signatures.contains(signature)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }
}

impl FromIterator<Signature> for DomainBoilerplate {
    fn from_iter<T: IntoIterator<Item = Signature>>(iter: T) -> Self {
        Self {
            signatures: iter.into_iter().collect(),
        }
    }
}
