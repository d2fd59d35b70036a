//! Print the canonical signature of every candidate subtree in a single HTML
//! document read from stdin.
//!
//! Usage:
//!     show-signature < page.html
use std::io::{stdin, Read};

use tracing_subscriber::EnvFilter;

use deboiler::candidates::{build_selector, DEFAULT_CANDIDATE_TAGS};
use deboiler::dom;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut input = String::new();
    stdin().read_to_string(&mut input)?;

    let document = dom::parse(input.as_bytes());
    let selector = build_selector(DEFAULT_CANDIDATE_TAGS)?;

    for el in deboiler::candidates::candidates(&document, &selector) {
        let signature = dom::signature_of(el);
        println!("{}\t{}", el.value().name(), signature);
    }

    Ok(())
}
