//! Candidate subtree selection (bounded tag allow-list).

use scraper::{ElementRef, Html, Selector};

use crate::error::PreconditionError;

/// Default candidate tag allow-list, per spec.
pub const DEFAULT_CANDIDATE_TAGS: &[&str] = &[
    "div", "nav", "navigation", "footer", "header", "aside", "section", "form", "ul", "ol",
];

/// Build a single combined [`Selector`] matching any of `tags`, the same
/// join-then-parse idiom `om-wikiparser::html`'s `ELEMENT_DENY_LIST` uses.
pub fn build_selector<I, S>(tags: I) -> Result<Selector, PreconditionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = tags
        .into_iter()
        .map(|t| t.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(", ");

    Selector::parse(&joined).map_err(|e| PreconditionError::InvalidCandidateTags(e.to_string()))
}

/// All descendant elements of `document` matching `selector`, in document
/// order. Candidates may be nested; each is yielded independently.
pub fn candidates<'a>(
    document: &'a Html,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document.select(selector)
}
