//! Domain aggregator: sort pages by URL, walk adjacent pairs, accumulate
//! the union of shared signatures into the domain boilerplate set.
//!
//! Multi-worker distribution (memory mode) partitions the sorted URL list
//! into contiguous chunks and processes each chunk's adjacent pairs (plus
//! the boundary pair shared with the following chunk) independently, the
//! same chunked-map + commutative-union-reduce shape
//! `om-wikiparser::get_tags::run` uses for its `rayon::par_bridge` fan-out.

use std::collections::HashMap;

use rayon::prelude::*;
use scraper::{Html, Selector};

use crate::boilerplate::DomainBoilerplate;
use crate::compare;
use crate::dataset::Dataset;
use crate::error::{DeboilerError, WorkerError};
use crate::mode::Mode;
use crate::page::PageRepresentation;

/// Output of [`fit`]: the accumulated boilerplate set, plus (performance
/// mode only) a cache of every page's parsed DOM, keyed by URL, for reuse
/// during `transform`.
pub struct FitOutcome {
    pub boilerplate: DomainBoilerplate,
    pub dom_cache: Option<HashMap<String, Html>>,
}

/// Run the fit pass over `dataset`.
///
/// Degenerate datasets of size 0 or 1 produce an empty boilerplate set
/// without failing (no pairs exist to compare). The only failure mode is
/// the multi-worker thread pool itself failing to start, surfaced as
/// [`WorkerError`] per spec.md §7's "worker failed to start" policy.
pub fn fit(
    dataset: &dyn Dataset,
    selector: &Selector,
    iou_max: f64,
    mode: Mode,
) -> Result<FitOutcome, DeboilerError> {
    let mut entries: Vec<(String, usize)> =
        dataset.urls().into_iter().enumerate().map(|(i, u)| (u, i)).collect();
    // Lexicographic byte order, stable so ties (duplicate URLs) keep their
    // original relative dataset order.
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let keep_dom = mode.caches_dom();
    let n_chunks = mode.workers().max(1);

    if entries.len() <= 1 {
        let dom_cache = keep_dom.then(|| {
            entries
                .iter()
                .filter_map(|(_, idx)| {
                    let (url, raw) = dataset.get(*idx).ok()?;
                    Some((url, crate::dom::parse(&raw)))
                })
                .collect()
        });
        return Ok(FitOutcome {
            boilerplate: DomainBoilerplate::new(),
            dom_cache,
        });
    }

    let chunks = partition_with_boundary(&entries, n_chunks);

    let results: Vec<ChunkResult> = if chunks.len() > 1 {
        // A worker-count-sized scoped pool, built and torn down for the
        // duration of this call, bounds concurrency to `n_processes`.
        // The process-wide default pool would let `n_processes` silently
        // disagree with the number of OS threads actually used.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_chunks)
            .build()
            .map_err(|e| WorkerError(e.to_string()))?;
        pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| process_chunk(chunk, dataset, selector, iou_max, keep_dom))
                .collect()
        })
    } else {
        chunks
            .iter()
            .map(|chunk| process_chunk(chunk, dataset, selector, iou_max, keep_dom))
            .collect()
    };

    let mut boilerplate = DomainBoilerplate::new();
    let mut dom_cache = keep_dom.then(HashMap::new);

    for result in results {
        boilerplate.merge(result.shared);
        if let (Some(cache), Some(doms)) = (dom_cache.as_mut(), result.doms) {
            cache.extend(doms);
        }
    }

    Ok(FitOutcome {
        boilerplate,
        dom_cache,
    })
}

/// Partition `entries` (already sorted) into `n_chunks` contiguous slices.
/// Each chunk (other than the last) additionally carries the first element
/// of the following chunk, so that worker `k` also processes the boundary
/// pair `(last_of_k, first_of_k+1)`. That pair is never processed twice.
fn partition_with_boundary(
    entries: &[(String, usize)],
    n_chunks: usize,
) -> Vec<Vec<(String, usize)>> {
    let n = entries.len();
    let chunk_size = n.div_ceil(n_chunks).max(1);

    let mut chunks: Vec<Vec<(String, usize)>> = entries
        .chunks(chunk_size)
        .map(|slice| slice.to_vec())
        .collect();

    for i in 0..chunks.len().saturating_sub(1) {
        if let Some(boundary) = chunks[i + 1].first().cloned() {
            chunks[i].push(boundary);
        }
    }

    chunks
}

struct ChunkResult {
    shared: std::collections::HashSet<crate::dom::Signature>,
    doms: Option<Vec<(String, Html)>>,
}

/// Walk one chunk's adjacent pairs with a sliding window of size 2,
/// building a [`PageRepresentation`] on demand and dropping it once it is
/// no longer the "previous" page for an upcoming comparison.
fn process_chunk(
    chunk: &[(String, usize)],
    dataset: &dyn Dataset,
    selector: &Selector,
    iou_max: f64,
    keep_dom: bool,
) -> ChunkResult {
    let mut shared = std::collections::HashSet::new();
    let mut doms = keep_dom.then(Vec::new);

    let mut prev: Option<PageRepresentation> = None;

    for (_, idx) in chunk {
        let (url, raw_html) = match dataset.get(*idx) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "skipping unreadable dataset record");
                prev = None;
                continue;
            }
        };

        let mut page = match PageRepresentation::build(url, &raw_html, selector, keep_dom) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "skipping page that failed to parse");
                prev = None;
                continue;
            }
        };

        if let (Some(doms), Some(dom)) = (doms.as_mut(), page.dom.take()) {
            doms.push((page.url.clone(), dom));
        }

        if let Some(previous) = &prev {
            shared.extend(compare::shared_signatures(
                &previous.signatures,
                &page.signatures,
                iou_max,
            ));
        }

        prev = Some(page);
    }

    ChunkResult { shared, doms }
}
