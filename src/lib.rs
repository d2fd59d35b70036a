//! Domain-level HTML boilerplate detector and remover.
//!
//! Given a collection of HTML pages crawled from a single web domain,
//! [`Deboiler`] discovers recurring structural fragments (navigation bars,
//! headers, footers, sidebars, cookie banners) that appear across multiple
//! pages ([`Deboiler::fit`]) and emits cleaned versions of each page with
//! those fragments stripped out ([`Deboiler::transform`]).

pub mod boilerplate;
pub mod candidates;
pub mod clean;
pub mod compare;
pub mod dataset;
pub mod dom;
pub mod error;
pub mod fit;
mod harness;
pub mod mode;
pub mod page;

pub use boilerplate::DomainBoilerplate;
pub use clean::CleanedPage;
pub use dataset::{Dataset, InMemoryDataset, JsonlDataset, JsonlFields};
pub use dom::Signature;
pub use error::{DatasetError, DeboilerError, ParseError, PreconditionError, WorkerError};
pub use harness::Deboiler;
pub use mode::Mode;
pub use page::PageRepresentation;
