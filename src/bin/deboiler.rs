//! Detect and remove domain-level HTML boilerplate from a JSON-lines crawl
//! dump.
//!
//! Usage:
//!     deboiler --domain example.com pages.jsonl output_dir/
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use deboiler::{Deboiler, JsonlDataset, JsonlFields};

/// Detect and remove recurring structural boilerplate across a domain's
/// crawled pages.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to a JSON-lines file, one `{url, html, status}` object per line.
    input: PathBuf,

    /// Directory to write `<slug>.html` / `<slug>.txt` pairs to.
    output_dir: PathBuf,

    /// Diagnostics-only domain label.
    #[arg(long, default_value = "unknown")]
    domain: String,

    /// Number of worker threads. Must be 1 when `--performance` is set.
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Cache parsed DOMs across fit/transform instead of re-parsing
    /// (restricted to a single worker).
    #[arg(long)]
    performance: bool,

    /// Near-duplicate IoU threshold above which a page pair is discarded.
    #[arg(long, default_value_t = 0.9)]
    iou_max: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_logfmt::layer())
        .init();

    let args = Args::parse();

    if !args.output_dir.is_dir() {
        bail!("output dir {:?} does not exist", args.output_dir);
    }

    tracing::info!(input = ?args.input, "loading dataset");
    let contents = fs::read(&args.input).with_context(|| format!("reading {:?}", args.input))?;
    let (dataset, errors) = JsonlDataset::from_bytes(contents, JsonlFields::default());
    for error in &errors {
        tracing::warn!(%error, "skipping dataset record");
    }
    tracing::info!(pages = dataset.len(), skipped = errors.len(), "dataset loaded");

    let mut deboiler = Deboiler::new(args.workers, args.performance, &args.domain)?;

    deboiler.fit(&dataset)?;
    tracing::info!(
        boilerplate_signatures = deboiler.boilerplate().map(|b| b.len()).unwrap_or_default(),
        "fit complete"
    );

    let mut written = 0usize;
    for page in deboiler.transform(&dataset)? {
        let slug = slugify(&page.url);

        let mut html_path = args.output_dir.join(&slug);
        html_path.set_extension("html");
        File::create(&html_path)
            .and_then(|mut f| f.write_all(page.cleaned_html.as_bytes()))
            .with_context(|| format!("writing {html_path:?}"))?;

        let mut text_path = args.output_dir.join(&slug);
        text_path.set_extension("txt");
        File::create(&text_path)
            .and_then(|mut f| f.write_all(page.cleaned_text.as_bytes()))
            .with_context(|| format!("writing {text_path:?}"))?;

        written += 1;
    }

    tracing::info!(written, "transform complete");

    Ok(())
}

/// Turn a URL into a filesystem-safe slug by replacing anything other than
/// ASCII alphanumerics, `-`, and `_` with `_`.
fn slugify(url: &str) -> String {
    let slug: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if slug.is_empty() {
        "page".to_owned()
    } else {
        slug
    }
}
