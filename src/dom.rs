//! Canonical, attribute-insensitive subtree serialization and DOM mutation.
//!
//! Wraps `scraper`/`ego-tree` the same way `om-wikiparser::html` does:
//! parsing never fails on real-world crawl output, and subtree removal is
//! idempotent (detaching an already-detached node is a no-op).

use std::hash::Hash;
use std::panic;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node};
use sha2::{Digest, Sha256};

use crate::error::{PanicMsg, ParseError};

/// Open marker: precedes a node's tag name (or, for text nodes, its content).
const OPEN: char = '\u{E000}';
/// Separator between a node's own data and the canonical strings of its children.
const SEP: char = '\u{E001}';
/// Close marker: ends a node.
const CLOSE: char = '\u{E002}';

/// A deterministic, attribute-insensitive fingerprint of a DOM subtree.
///
/// Two subtrees that differ only in attribute values hash to the same
/// `Signature`; any difference in tag names, child order, child count, or
/// visible text changes it. Stored as a truncated SHA-256 digest of the
/// canonical string (see [`canonical_string`]) rather than the string itself,
/// to keep `PageRepresentation`s cheap to hold in memory across a whole
/// domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature([u8; 16]);

impl Signature {
    fn of(canonical: &str) -> Self {
        let digest = Sha256::digest(canonical.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Parse raw bytes into a DOM tree.
///
/// Tolerant of malformed HTML (`html5ever` always produces *some* tree);
/// bytes that aren't valid UTF-8 are lossily decoded rather than rejected, so
/// this never fails on real-world crawl output.
pub fn parse(raw_html: &[u8]) -> Html {
    let text = String::from_utf8_lossy(raw_html);
    Html::parse_document(&text)
}

/// Recursive pre-order canonical string for `el` and its descendants.
///
/// Attributes are never emitted. Comments, processing instructions, and
/// doctypes are omitted. Whitespace-only text nodes are omitted; other text
/// nodes have their whitespace collapsed to single spaces and are trimmed.
pub fn canonical_string(el: ElementRef) -> String {
    let mut out = String::new();
    write_canonical(el.id(), el, &mut out);
    out
}

fn write_canonical(id: NodeId, el: ElementRef, out: &mut String) {
    let Some(node_ref) = el.tree().get(id) else {
        return;
    };

    match node_ref.value() {
        Node::Element(element) => {
            out.push(OPEN);
            out.push_str(element.name());
            out.push(SEP);
            for child in node_ref.children() {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_canonical(child_el.id(), child_el, out);
                } else if let Some(text) = child.value().as_text() {
                    write_text(text, out);
                }
            }
            out.push(CLOSE);
        }
        Node::Text(text) => write_text(text, out),
        // Comments, PIs, and doctypes are never emitted.
        _ => {}
    }
}

fn write_text(text: &str, out: &mut String) {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return;
    }
    out.push(OPEN);
    out.push_str(&collapsed);
    out.push(CLOSE);
}

/// Collapse runs of whitespace to a single space and trim the ends.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true; // treat leading whitespace as already-seen
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Compute the [`Signature`] of a candidate subtree.
pub fn signature_of(el: ElementRef) -> Signature {
    Signature::of(&canonical_string(el))
}

/// Detach `id` from its parent. Safe (no-op) if `id` is already detached or
/// does not exist in `document`.
pub fn remove(document: &mut Html, id: NodeId) {
    if let Some(mut node) = document.tree.get_mut(id) {
        if node.parent().is_some() {
            node.detach();
        }
    }
}

/// Serialize the whole document back to an HTML string.
pub fn serialize(document: &Html) -> String {
    document.html()
}

/// Elements whose visible text should *not* force a line break when
/// concatenating cleaned text. Modeled on
/// `om-wikiparser::html::pretty::INLINE_ELEMENTS`, reused here to decide
/// text-join behavior instead of indentation.
fn is_inline(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "bdi"
            | "bdo"
            | "cite"
            | "code"
            | "data"
            | "del"
            | "dfn"
            | "em"
            | "i"
            | "ins"
            | "kbd"
            | "mark"
            | "q"
            | "s"
            | "samp"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "time"
            | "u"
            | "var"
    )
}

/// Concatenate the document's visible text, whitespace-normalized: runs of
/// whitespace collapse to a single space, and a newline is inserted after
/// block-level elements instead of a space.
pub fn text_of(document: &Html) -> String {
    let mut out = String::new();
    if let Some(root) = ElementRef::wrap(document.tree.root()) {
        write_text_of(root, &mut out);
    }
    normalize_newlines(&out)
}

fn write_text_of(el: ElementRef, out: &mut String) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            write_text_of(child_el, out);
            if !is_inline(child_el.value().name()) {
                out.push('\n');
            } else {
                out.push(' ');
            }
        } else if let Some(text) = child.value().as_text() {
            let collapsed = collapse_whitespace(text);
            if !collapsed.is_empty() {
                out.push_str(&collapsed);
                out.push(' ');
            }
        }
    }
}

/// Collapse runs of plain spaces around forced newlines and trim each line.
fn normalize_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        let trimmed = collapse_whitespace(line);
        if !trimmed.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&trimmed);
        }
    }
    out
}

/// Run `f` over the document, converting a panic in underlying DOM crates
/// (which can occur with some tree mutations) into a [`ParseError`].
///
/// Mirrors `om-wikiparser::html::process`'s `panic::catch_unwind` wrapper.
pub fn catch_dom_panic<T>(f: impl FnOnce() -> T + panic::UnwindSafe) -> Result<T, ParseError> {
    panic::catch_unwind(f).map_err(|payload| ParseError::Panic(PanicMsg::new(payload)))
}
