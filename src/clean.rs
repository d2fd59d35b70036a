//! Cleaner (`transform`): removes every candidate subtree whose signature is
//! in the domain boilerplate set and emits cleaned HTML/text.

use std::collections::HashMap;

use rayon::prelude::*;
use scraper::{Html, Selector};

use crate::boilerplate::DomainBoilerplate;
use crate::candidates;
use crate::dataset::Dataset;
use crate::dom;
use crate::error::{DeboilerError, WorkerError};
use crate::mode::Mode;

/// `(url, cleaned_html, cleaned_text)` emitted for each page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPage {
    pub url: String,
    pub cleaned_html: String,
    pub cleaned_text: String,
}

/// Clean one already-parsed (or freshly-parsed) document in place.
///
/// Nested-candidate policy: collect every matching node id in one top-down
/// pass, then detach them in a second pass, so that detaching an ancestor
/// never invalidates the iterator walking its still-pending descendants,
/// the same collect-then-remove shape `om-wikiparser::html::remove_denylist_elements`
/// uses.
fn clean_document(document: &mut Html, selector: &Selector, boilerplate: &DomainBoilerplate) {
    let to_remove: Vec<_> = candidates::candidates(document, selector)
        .filter(|el| boilerplate.is_boilerplate(&dom::signature_of(*el)))
        .map(|el| el.id())
        .collect();

    for id in to_remove {
        dom::remove(document, id);
    }
}

/// Produce a [`CleanedPage`] for one record, obtaining its DOM from `cache`
/// (performance mode) or by re-parsing `raw_html` (memory mode).
fn clean_one(
    url: String,
    raw_html: &[u8],
    selector: &Selector,
    boilerplate: &DomainBoilerplate,
    cached: Option<&Html>,
) -> CleanedPage {
    let mut document = match cached {
        Some(dom) => dom.clone(),
        None => dom::parse(raw_html),
    };

    let cleaned = dom::catch_dom_panic(|| {
        clean_document(&mut document, selector, boilerplate);
        (dom::serialize(&document), dom::text_of(&document))
    });

    match cleaned {
        Ok((cleaned_html, cleaned_text)) => CleanedPage {
            url,
            cleaned_html,
            cleaned_text,
        },
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "failed to clean page, emitting raw html");
            // Policy: a page that fails to parse/clean is still emitted, with
            // the original bytes as `cleaned_html` and empty `cleaned_text`,
            // rather than dropped from the output stream.
            CleanedPage {
                url,
                cleaned_html: String::from_utf8_lossy(raw_html).into_owned(),
                cleaned_text: String::new(),
            }
        }
    }
}

/// Run the transform pass over `dataset`'s natural (not sorted) order.
///
/// With a single worker, this is a genuinely lazy, sequential iterator.
/// With multiple workers (memory mode only), pages are cleaned in parallel
/// and reassembled in dataset-index order before being returned, since
/// `scraper`'s `Selector`/`Html` borrow from thread-local parser state that
/// is cheaper to rebuild per item than to share across threads. Starting
/// the worker pool itself is the only failure mode, surfaced as
/// [`WorkerError`] per spec.md §7.
pub fn transform<'a>(
    dataset: &'a dyn Dataset,
    selector: &'a Selector,
    boilerplate: &'a DomainBoilerplate,
    mode: Mode,
    dom_cache: Option<&'a HashMap<String, Html>>,
) -> Result<Box<dyn Iterator<Item = CleanedPage> + 'a>, DeboilerError> {
    let n = dataset.len();

    if mode.workers() <= 1 {
        return Ok(Box::new(
            (0..n).filter_map(move |i| clean_at(dataset, selector, boilerplate, dom_cache, i)),
        ));
    }

    // Bound actual OS-thread concurrency to `mode.workers()` for the
    // duration of this call; the pool is dropped (and its threads joined)
    // before `transform` returns.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(mode.workers())
        .build()
        .map_err(|e| WorkerError(e.to_string()))?;

    // Thread the original dataset index through the pipeline rather than
    // re-deriving position from the URL string: two records can share a
    // URL (`Dataset` never forbids duplicates), and a url-keyed map would
    // collapse them onto the same sort key, scrambling their relative
    // order.
    let mut cleaned: Vec<(usize, CleanedPage)> = pool.install(|| {
        (0..n)
            .into_par_iter()
            .filter_map(|i| clean_at(dataset, selector, boilerplate, dom_cache, i).map(|page| (i, page)))
            .collect()
    });

    cleaned.sort_by_key(|(i, _)| *i);
    Ok(Box::new(cleaned.into_iter().map(|(_, page)| page)))
}

fn clean_at(
    dataset: &dyn Dataset,
    selector: &Selector,
    boilerplate: &DomainBoilerplate,
    dom_cache: Option<&HashMap<String, Html>>,
    i: usize,
) -> Option<CleanedPage> {
    match dataset.get(i) {
        Ok((url, raw_html)) => {
            let cached = dom_cache.and_then(|cache| cache.get(&url));
            Some(clean_one(url, &raw_html, selector, boilerplate, cached))
        }
        Err(e) => {
            tracing::warn!(index = i, error = %e, "skipping unreadable dataset record");
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::candidates::{build_selector, DEFAULT_CANDIDATE_TAGS};
    use crate::dataset::InMemoryDataset;
    use crate::dom::Signature;

    fn selector() -> Selector {
        build_selector(DEFAULT_CANDIDATE_TAGS).unwrap()
    }

    fn nav_signature() -> Signature {
        let document = Html::parse_fragment("<nav><a>Home</a><a>About</a></nav>");
        let sel = selector();
        let el = candidates::candidates(&document, &sel).next().unwrap();
        dom::signature_of(el)
    }

    #[test]
    fn removes_matched_boilerplate_keeps_main() {
        let html = br#"<nav><a href="/x">Home</a><a href="/y">About</a></nav><main>Body text</main>"#;
        let mut boilerplate = DomainBoilerplate::new();
        boilerplate.merge([nav_signature()].into());

        let dataset = InMemoryDataset::new(vec![("/a".to_owned(), html.to_vec())]);
        let sel = selector();
        let cleaned: Vec<_> = transform(&dataset, &sel, &boilerplate, Mode::new(1, false).unwrap(), None)
            .unwrap()
            .collect();

        assert_eq!(cleaned.len(), 1);
        assert!(!cleaned[0].cleaned_html.contains("<nav"));
        assert!(cleaned[0].cleaned_html.contains("<main>"));
        assert_eq!(cleaned[0].cleaned_text, "Body text");
    }

    #[test]
    fn removing_outer_header_drops_nested_nav_without_error() {
        let html = b"<header><nav><a>Home</a><a>About</a></nav></header><main>Content</main>";

        let document = Html::parse_fragment(std::str::from_utf8(html).unwrap());
        let sel = selector();
        let header = candidates::candidates(&document, &sel).next().unwrap();
        let header_sig = dom::signature_of(header);

        let mut boilerplate = DomainBoilerplate::new();
        boilerplate.merge([header_sig, nav_signature()].into());

        let dataset = InMemoryDataset::new(vec![("/a".to_owned(), html.to_vec())]);
        let cleaned: Vec<_> = transform(&dataset, &sel, &boilerplate, Mode::new(1, false).unwrap(), None)
            .unwrap()
            .collect();

        assert!(!cleaned[0].cleaned_html.contains("<header"));
        assert!(!cleaned[0].cleaned_html.contains("<nav"));
        assert!(cleaned[0].cleaned_html.contains("Content"));
    }

    #[test]
    fn empty_boilerplate_leaves_pages_unchanged_text() {
        let html = b"<nav><a>Home</a></nav><main>Body</main>";
        let boilerplate = DomainBoilerplate::new();
        let dataset = InMemoryDataset::new(vec![("/a".to_owned(), html.to_vec())]);
        let sel = selector();
        let cleaned: Vec<_> = transform(&dataset, &sel, &boilerplate, Mode::new(1, false).unwrap(), None)
            .unwrap()
            .collect();
        assert_eq!(cleaned[0].cleaned_text, "Home\nBody");
    }

    #[test]
    fn idempotent_on_already_cleaned_output() {
        let html = br#"<nav><a href="/x">Home</a><a href="/y">About</a></nav><main>Body text</main>"#;
        let mut boilerplate = DomainBoilerplate::new();
        boilerplate.merge([nav_signature()].into());

        let sel = selector();
        let dataset = InMemoryDataset::new(vec![("/a".to_owned(), html.to_vec())]);
        let first: Vec<_> =
            transform(&dataset, &sel, &boilerplate, Mode::new(1, false).unwrap(), None)
                .unwrap()
                .collect();

        let reparsed = InMemoryDataset::new(vec![(
            "/a".to_owned(),
            first[0].cleaned_html.clone().into_bytes(),
        )]);
        let second: Vec<_> =
            transform(&reparsed, &sel, &boilerplate, Mode::new(1, false).unwrap(), None)
                .unwrap()
                .collect();

        assert_eq!(first[0].cleaned_html, second[0].cleaned_html);
    }

    #[test]
    fn multi_worker_preserves_dataset_order() {
        let pages: Vec<_> = (0..10)
            .map(|i| (format!("/p{i}"), format!("<main>{i}</main>").into_bytes()))
            .collect();
        let dataset = InMemoryDataset::new(pages);
        let boilerplate = DomainBoilerplate::new();
        let sel = selector();
        let cleaned: Vec<_> =
            transform(&dataset, &sel, &boilerplate, Mode::new(4, false).unwrap(), None)
                .unwrap()
                .collect();
        let urls: Vec<_> = cleaned.iter().map(|p| p.url.clone()).collect();
        let expected: Vec<_> = (0..10).map(|i| format!("/p{i}")).collect();
        assert_eq!(urls, expected);
    }

    #[test]
    fn multi_worker_preserves_order_with_duplicate_urls() {
        // Several records share the same url; a url-keyed reorder would
        // collapse them onto one sort key and scramble their relative
        // order. Each body carries its own index so the expected order is
        // checked by content, not by (non-unique) url.
        let pages: Vec<_> = (0..12)
            .map(|i| ("/dup".to_owned(), format!("<main>{i}</main>").into_bytes()))
            .collect();
        let dataset = InMemoryDataset::new(pages);
        let boilerplate = DomainBoilerplate::new();
        let sel = selector();
        let cleaned: Vec<_> =
            transform(&dataset, &sel, &boilerplate, Mode::new(4, false).unwrap(), None)
                .unwrap()
                .collect();
        let bodies: Vec<_> = cleaned.iter().map(|p| p.cleaned_text.clone()).collect();
        let expected: Vec<_> = (0..12).map(|i| i.to_string()).collect();
        assert_eq!(bodies, expected);
    }
}
