//! Execution harness: the public `Deboiler` façade that selects an
//! operating mode and drives `fit`/`transform` over it.

use std::collections::HashMap;

use scraper::{Html, Selector};

use crate::boilerplate::DomainBoilerplate;
use crate::candidates::{self, DEFAULT_CANDIDATE_TAGS};
use crate::clean::{self, CleanedPage};
use crate::compare::DEFAULT_IOU_MAX;
use crate::dataset::Dataset;
use crate::error::{DeboilerError, PreconditionError};
use crate::fit;
use crate::mode::Mode;

/// Domain-level HTML boilerplate detector and remover.
///
/// ```
/// use deboiler::{Deboiler, InMemoryDataset};
///
/// let dataset = InMemoryDataset::new(vec![
///     ("/a".to_owned(), b"<nav><a>Home</a></nav><main>A</main>".to_vec()),
///     ("/b".to_owned(), b"<nav><a>Home</a></nav><main>B</main>".to_vec()),
/// ]);
///
/// let mut deboiler = Deboiler::memory(1, "example.com").unwrap();
/// deboiler.fit(&dataset).unwrap();
/// let cleaned: Vec<_> = deboiler.transform(&dataset).unwrap().collect();
/// assert_eq!(cleaned.len(), 2);
/// ```
pub struct Deboiler {
    mode: Mode,
    domain: String,
    iou_max: f64,
    selector: Selector,
    boilerplate: Option<DomainBoilerplate>,
    dom_cache: Option<HashMap<String, Html>>,
}

impl Deboiler {
    /// Construct a new harness.
    ///
    /// `domain` is a diagnostics-only label (it appears in log lines, not in
    /// any algorithmic decision). `performance` selects `Mode::Performance`
    /// (which forbids `n_processes > 1`, surfaced as a `PreconditionError`)
    /// versus `Mode::Memory`.
    pub fn new(
        n_processes: usize,
        performance: bool,
        domain: impl Into<String>,
    ) -> Result<Self, DeboilerError> {
        Self::with_config(n_processes, performance, domain, DEFAULT_IOU_MAX, DEFAULT_CANDIDATE_TAGS)
    }

    /// Full constructor exposing every configuration option from spec §6.
    pub fn with_config<I, S>(
        n_processes: usize,
        performance: bool,
        domain: impl Into<String>,
        iou_max: f64,
        candidate_tags: I,
    ) -> Result<Self, DeboilerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mode = Mode::new(n_processes, performance).map_err(DeboilerError::from)?;
        let selector = candidates::build_selector(candidate_tags).map_err(DeboilerError::from)?;

        Ok(Self {
            mode,
            domain: domain.into(),
            iou_max,
            selector,
            boilerplate: None,
            dom_cache: None,
        })
    }

    /// Convenience constructor for memory mode with the default IoU
    /// threshold and candidate tag allow-list.
    pub fn memory(workers: usize, domain: impl Into<String>) -> Result<Self, DeboilerError> {
        Self::new(workers, false, domain)
    }

    /// Convenience constructor for performance mode (always one worker).
    pub fn performance(domain: impl Into<String>) -> Result<Self, DeboilerError> {
        Self::new(1, true, domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn boilerplate(&self) -> Option<&DomainBoilerplate> {
        self.boilerplate.as_ref()
    }

    /// Populate the domain boilerplate set by sorting `dataset`'s URLs and
    /// walking adjacent pairs (see the `fit` module).
    pub fn fit(&mut self, dataset: &dyn Dataset) -> Result<&mut Self, DeboilerError> {
        tracing::info!(domain = %self.domain, pages = dataset.len(), "starting fit");

        let outcome = fit::fit(dataset, &self.selector, self.iou_max, self.mode)?;

        tracing::info!(
            domain = %self.domain,
            boilerplate_signatures = outcome.boilerplate.len(),
            "fit complete"
        );

        self.boilerplate = Some(outcome.boilerplate);
        self.dom_cache = outcome.dom_cache;

        Ok(self)
    }

    /// Remove every candidate subtree whose signature is in the domain
    /// boilerplate set and emit a [`CleanedPage`] per record, in `dataset`'s
    /// natural order.
    ///
    /// Must be called after [`Deboiler::fit`]; calling before `fit` returns
    /// `PreconditionError::NotFit`.
    pub fn transform<'a>(
        &'a self,
        dataset: &'a dyn Dataset,
    ) -> Result<Box<dyn Iterator<Item = CleanedPage> + 'a>, DeboilerError> {
        let boilerplate = self
            .boilerplate
            .as_ref()
            .ok_or(PreconditionError::NotFit)?;

        clean::transform(
            dataset,
            &self.selector,
            boilerplate,
            self.mode,
            self.dom_cache.as_ref(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataset::InMemoryDataset;

    #[test]
    fn transform_before_fit_is_a_precondition_error() {
        let dataset = InMemoryDataset::new(vec![]);
        let deboiler = Deboiler::memory(1, "example.com").unwrap();
        let err = deboiler.transform(&dataset).unwrap_err();
        assert!(matches!(
            err,
            DeboilerError::Precondition(PreconditionError::NotFit)
        ));
    }

    #[test]
    fn performance_mode_with_workers_is_rejected() {
        let err = Deboiler::new(4, true, "example.com").unwrap_err();
        assert!(matches!(
            err,
            DeboilerError::Precondition(PreconditionError::PerformanceModeWorkers(4))
        ));
    }

    #[test]
    fn end_to_end_shared_nav_removed() {
        let dataset = InMemoryDataset::new(vec![
            (
                "/a".to_owned(),
                b"<nav><a href=\"/x\">Home</a></nav><main>Alpha</main>".to_vec(),
            ),
            (
                "/b".to_owned(),
                b"<nav><a href=\"/y\">Home</a></nav><main>Beta</main>".to_vec(),
            ),
        ]);

        let mut deboiler = Deboiler::memory(1, "example.com").unwrap();
        deboiler.fit(&dataset).unwrap();
        assert_eq!(deboiler.boilerplate().unwrap().len(), 1);

        let cleaned: Vec<_> = deboiler.transform(&dataset).unwrap().collect();
        assert_eq!(cleaned.len(), 2);
        for page in &cleaned {
            assert!(!page.cleaned_html.contains("<nav"));
        }
    }

    #[test]
    fn performance_and_memory_modes_agree() {
        let pages = vec![
            (
                "/a".to_owned(),
                b"<nav><a>Home</a></nav><main>Alpha body</main>".to_vec(),
            ),
            (
                "/b".to_owned(),
                b"<nav><a>Home</a></nav><main>Beta body</main>".to_vec(),
            ),
        ];

        let mem_dataset = InMemoryDataset::new(pages.clone());
        let mut mem = Deboiler::memory(1, "example.com").unwrap();
        mem.fit(&mem_dataset).unwrap();
        let mem_cleaned: Vec<_> = mem.transform(&mem_dataset).unwrap().collect();

        let perf_dataset = InMemoryDataset::new(pages);
        let mut perf = Deboiler::performance("example.com").unwrap();
        perf.fit(&perf_dataset).unwrap();
        let perf_cleaned: Vec<_> = perf.transform(&perf_dataset).unwrap().collect();

        assert_eq!(mem_cleaned, perf_cleaned);
    }
}
