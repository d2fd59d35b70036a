//! Dataset interface and default implementations.
//!
//! `spec.md` treats the dataset loader itself as an external collaborator,
//! but specifies its interface and a default JSON-lines implementation
//! (§6), both implemented here.

use std::sync::Arc;

use serde_json::Value;

use crate::error::DatasetError;

/// Random-access record store yielding `(url, raw_html)` pairs.
pub trait Dataset: Send + Sync {
    /// Number of records.
    fn len(&self) -> usize;

    /// Whether there are no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Random access by index; `i` must be `< len()`.
    fn get(&self, i: usize) -> Result<(String, Vec<u8>), DatasetError>;

    /// All URLs, without loading raw bodies.
    fn urls(&self) -> Vec<String>;
}

/// The simplest possible [`Dataset`]: an in-memory vector of pages.
///
/// Used by tests and by callers who already have pages loaded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    pages: Vec<(String, Vec<u8>)>,
}

impl InMemoryDataset {
    pub fn new(pages: Vec<(String, Vec<u8>)>) -> Self {
        Self { pages }
    }
}

impl FromIterator<(String, Vec<u8>)> for InMemoryDataset {
    fn from_iter<T: IntoIterator<Item = (String, Vec<u8>)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.pages.len()
    }

    fn get(&self, i: usize) -> Result<(String, Vec<u8>), DatasetError> {
        self.pages
            .get(i)
            .cloned()
            .ok_or(DatasetError::OutOfBounds(i))
    }

    fn urls(&self) -> Vec<String> {
        self.pages.iter().map(|(url, _)| url.clone()).collect()
    }
}

/// Configurable field names and status filter for [`JsonlDataset`].
#[derive(Debug, Clone)]
pub struct JsonlFields {
    pub url_field: String,
    pub html_field: String,
    pub status_field: String,
    /// Only records whose `status_field` equals this value are kept.
    pub accepted_status: i64,
}

impl Default for JsonlFields {
    fn default() -> Self {
        Self {
            url_field: "url".to_owned(),
            html_field: "html".to_owned(),
            status_field: "status".to_owned(),
            accepted_status: 200,
        }
    }
}

/// A JSON-lines-backed [`Dataset`].
///
/// Reads the whole file into an `Arc<[u8]>` once at construction and builds
/// an index of the byte range of each accepted line. Because the backing
/// bytes are shared and read-only, worker threads can hold a clone of the
/// `Arc` with no locking, which stands in for spec.md's "per-worker file
/// handles with seek-to-offset on an index built at construction".
pub struct JsonlDataset {
    bytes: Arc<[u8]>,
    /// `(line_start, line_len)` for each accepted record, in file order.
    lines: Vec<(usize, usize)>,
    urls: Vec<String>,
    fields: JsonlFields,
}

impl JsonlDataset {
    /// Parse `contents` (one JSON object per line) with `fields`, skipping
    /// malformed or filtered-out lines. Returns the dataset plus the
    /// per-line errors encountered (for diagnostics), matching spec.md §7's
    /// "skip record, continue" policy.
    pub fn from_bytes(contents: Vec<u8>, fields: JsonlFields) -> (Self, Vec<DatasetError>) {
        let bytes: Arc<[u8]> = contents.into();
        let mut lines = Vec::new();
        let mut urls = Vec::new();
        let mut errors = Vec::new();

        let mut offset = 0usize;
        let mut line_num = 0u64;
        for raw_line in bytes.split(|b| *b == b'\n') {
            line_num += 1;
            let start = offset;
            let len = raw_line.len();
            offset += len + 1; // account for the newline byte consumed by split

            if raw_line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match index_line(raw_line, &fields, line_num) {
                Ok(LineOutcome::Accepted { url }) => {
                    urls.push(url);
                    lines.push((start, len));
                }
                Ok(LineOutcome::FilteredOut) => {}
                Err(e) => errors.push(e),
            }
        }

        (
            Self {
                bytes,
                lines,
                urls,
                fields,
            },
            errors,
        )
    }
}

enum LineOutcome {
    Accepted { url: String },
    FilteredOut,
}

/// Validate a line's shape (without allocating its HTML body) and extract
/// its URL, or report why it was filtered out / malformed.
fn index_line(
    line: &[u8],
    fields: &JsonlFields,
    line_num: u64,
) -> Result<LineOutcome, DatasetError> {
    let value: Value = serde_json::from_slice(line).map_err(|source| DatasetError::Json {
        line: line_num,
        source,
    })?;

    let status = value.get(&fields.status_field).and_then(Value::as_i64);
    if status != Some(fields.accepted_status) {
        return Ok(LineOutcome::FilteredOut);
    }

    let url = value
        .get(&fields.url_field)
        .and_then(Value::as_str)
        .ok_or(DatasetError::MissingField {
            line: line_num,
            field: "url",
        })?
        .to_owned();

    if value.get(&fields.html_field).and_then(Value::as_str).is_none() {
        return Err(DatasetError::MissingField {
            line: line_num,
            field: "html",
        });
    }

    Ok(LineOutcome::Accepted { url })
}

impl Dataset for JsonlDataset {
    fn len(&self) -> usize {
        self.lines.len()
    }

    fn get(&self, i: usize) -> Result<(String, Vec<u8>), DatasetError> {
        let (start, len) = *self.lines.get(i).ok_or(DatasetError::OutOfBounds(i))?;
        let url = self
            .urls
            .get(i)
            .cloned()
            .ok_or(DatasetError::OutOfBounds(i))?;
        let line = &self.bytes[start..start + len];
        let value: Value = serde_json::from_slice(line).map_err(|source| DatasetError::Json {
            line: i as u64,
            source,
        })?;
        let html = value
            .get(&self.fields.html_field)
            .and_then(Value::as_str)
            .ok_or(DatasetError::MissingField {
                line: i as u64,
                field: "html",
            })?
            .as_bytes()
            .to_vec();
        Ok((url, html))
    }

    fn urls(&self) -> Vec<String> {
        self.urls.clone()
    }
}
