//! End-to-end coverage of `Deboiler` over an in-memory dataset, independent
//! of any particular internal module.

use deboiler::{Deboiler, InMemoryDataset};

fn pages() -> InMemoryDataset {
    InMemoryDataset::new(vec![
        (
            "https://example.com/a".to_owned(),
            br#"<html><body>
                <nav><a href="/x">Home</a><a href="/y">About</a></nav>
                <main><h1>Alpha</h1><p>Unique article body for page a.</p></main>
                <footer>Copyright 2026 Example Corp</footer>
            </body></html>"#
                .to_vec(),
        ),
        (
            "https://example.com/b".to_owned(),
            br#"<html><body>
                <nav><a href="/x">Home</a><a href="/y">About</a></nav>
                <main><h1>Beta</h1><p>A completely different body for page b.</p></main>
                <footer>Copyright 2026 Example Corp</footer>
            </body></html>"#
                .to_vec(),
        ),
        (
            "https://example.com/c".to_owned(),
            br#"<html><body>
                <nav><a href="/x">Home</a><a href="/y">About</a></nav>
                <main><h1>Gamma</h1><p>Page c has its own unique content here.</p></main>
                <footer>Copyright 2026 Example Corp</footer>
            </body></html>"#
                .to_vec(),
        ),
    ])
}

#[test]
fn fit_then_transform_strips_shared_nav_and_footer() {
    let dataset = pages();
    let mut deboiler = Deboiler::memory(1, "example.com").unwrap();

    deboiler.fit(&dataset).unwrap();
    let boilerplate = deboiler.boilerplate().unwrap();
    assert_eq!(boilerplate.len(), 2, "expected the shared nav and footer, nothing else");

    let cleaned: Vec<_> = deboiler.transform(&dataset).unwrap().collect();
    assert_eq!(cleaned.len(), 3);

    for page in &cleaned {
        assert!(!page.cleaned_html.contains("<nav"), "{}", page.url);
        assert!(!page.cleaned_html.contains("<footer"), "{}", page.url);
        assert!(page.cleaned_html.contains("<main>"), "{}", page.url);
    }

    let alpha = cleaned
        .iter()
        .find(|p| p.url == "https://example.com/a")
        .unwrap();
    assert!(alpha.cleaned_text.contains("Unique article body for page a"));
    assert!(!alpha.cleaned_text.contains("Copyright"));
}

#[test]
fn memory_and_performance_modes_produce_identical_output() {
    let memory_dataset = pages();
    let mut memory = Deboiler::memory(2, "example.com").unwrap();
    memory.fit(&memory_dataset).unwrap();
    let memory_cleaned: Vec<_> = memory.transform(&memory_dataset).unwrap().collect();

    let performance_dataset = pages();
    let mut performance = Deboiler::performance("example.com").unwrap();
    performance.fit(&performance_dataset).unwrap();
    let performance_cleaned: Vec<_> = performance.transform(&performance_dataset).unwrap().collect();

    assert_eq!(memory_cleaned, performance_cleaned);
}

#[test]
fn transform_without_fit_is_a_precondition_error() {
    let dataset = pages();
    let deboiler = Deboiler::memory(1, "example.com").unwrap();
    assert!(deboiler.transform(&dataset).is_err());
}

#[test]
fn single_page_dataset_yields_no_boilerplate_but_still_cleans() {
    let dataset = InMemoryDataset::new(vec![(
        "https://example.com/only".to_owned(),
        b"<nav><a>Home</a></nav><main>Only page content</main>".to_vec(),
    )]);

    let mut deboiler = Deboiler::memory(1, "example.com").unwrap();
    deboiler.fit(&dataset).unwrap();
    assert!(deboiler.boilerplate().unwrap().is_empty());

    let cleaned: Vec<_> = deboiler.transform(&dataset).unwrap().collect();
    assert_eq!(cleaned.len(), 1);
    assert!(cleaned[0].cleaned_html.contains("<nav"));
}

#[test]
fn near_duplicate_pages_are_excluded_from_boilerplate_discovery() {
    // /a and /b are identical apart from the url itself, so their IoU is 1.0
    // and the pair contributes nothing to the boilerplate set even though
    // every candidate subtree matches.
    let html = br#"<nav><a href="/x">Home</a></nav><footer>Shared footer</footer>"#.to_vec();
    let dataset = InMemoryDataset::new(vec![
        ("https://example.com/a".to_owned(), html.clone()),
        ("https://example.com/b".to_owned(), html),
        (
            "https://example.com/c".to_owned(),
            br#"<nav><a href="/x">Home</a></nav><footer>Different footer text</footer>"#.to_vec(),
        ),
    ]);

    let mut deboiler = Deboiler::memory(1, "example.com").unwrap();
    deboiler.fit(&dataset).unwrap();
    // Only the nav survives: (a,b) is discarded as near-duplicate, and the
    // (b,c) pair only shares the nav since the footers differ.
    assert_eq!(deboiler.boilerplate().unwrap().len(), 1);
}
