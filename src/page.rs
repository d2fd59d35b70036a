//! Per-page bundle of candidate signatures, plus optionally a cached DOM.

use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::candidates;
use crate::dom::{self, Signature};
use crate::error::ParseError;

/// A parsed page plus the set of candidate subtree signatures it contains.
///
/// `dom` is populated only in performance mode (cached for reuse during
/// `transform`); it is `None` in memory mode, where the page is re-parsed on
/// demand.
pub struct PageRepresentation {
    pub url: String,
    pub signatures: HashSet<Signature>,
    pub dom: Option<Html>,
}

impl PageRepresentation {
    /// Parse `raw_html` and eagerly compute its candidate signature set.
    ///
    /// `keep_dom` controls whether the parsed tree is retained (performance
    /// mode) or dropped after the signatures are extracted (memory mode).
    pub fn build(
        url: impl Into<String>,
        raw_html: &[u8],
        selector: &Selector,
        keep_dom: bool,
    ) -> Result<Self, ParseError> {
        let document = dom::parse(raw_html);
        let signatures = dom::catch_dom_panic(|| {
            candidates::candidates(&document, selector)
                .map(dom::signature_of)
                .collect::<HashSet<_>>()
        })?;

        Ok(Self {
            url: url.into(),
            signatures,
            dom: keep_dom.then_some(document),
        })
    }
}
