//! Embedded JSON literal extraction
//!
//! Locates the object literal assigned to `window.gameData` inside the raw
//! puzzle page and returns exactly the balanced `{...}` text, without parsing
//! the surrounding HTML or script. The scanner counts braces outside string
//! values and honours backslash escapes inside them, so quoted braces and
//! semicolons never end the literal early.

use serde_json::Value;
use thiserror::Error;

/// Marker that immediately precedes the puzzle data in the page
pub const MARKER: &str = "window.gameData = ";

/// Number of characters shown on each side of a failure position
const SNIPPET_RADIUS: usize = 40;

/// Errors that can occur while pulling the literal out of a document
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The marker text does not appear in the document
    #[error("data marker not found in {document_len}-byte document")]
    MarkerNotFound { document_len: usize },

    /// The marker was found but the braces never balanced
    #[error("unterminated data literal at byte {offset} (open braces: {depth}) near {snippet:?}")]
    UnterminatedLiteral {
        offset: usize,
        depth: usize,
        snippet: String,
    },

    /// The balanced literal is not valid JSON
    #[error("JSON syntax error at line {line}, column {column}: {source} near {snippet:?}")]
    JsonSyntax {
        line: usize,
        column: usize,
        snippet: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractError {
    /// Byte offset of the failure, when one is known
    pub fn offset(&self) -> Option<usize> {
        match self {
            ExtractError::UnterminatedLiteral { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Short text window around the failure, when one is known
    pub fn snippet(&self) -> Option<&str> {
        match self {
            ExtractError::MarkerNotFound { .. } => None,
            ExtractError::UnterminatedLiteral { snippet, .. }
            | ExtractError::JsonSyntax { snippet, .. } => Some(snippet),
        }
    }
}

/// Returns the byte offset of the first occurrence of `marker`
pub fn locate(document: &str, marker: &str) -> Option<usize> {
    document.find(marker)
}

/// Extracts the balanced JSON object literal that follows `marker`.
///
/// The returned slice starts right after the marker (any whitespace before
/// the opening brace is kept) and ends with the brace that closes the
/// outermost object.
///
/// # Returns
/// * `Ok(&str)` - The literal text, borrowed from `document`
/// * `Err(ExtractError::MarkerNotFound)` - The marker is absent
/// * `Err(ExtractError::UnterminatedLiteral)` - No `{` follows the marker, or
///   the document ends before the outer brace closes
pub fn extract<'a>(document: &'a str, marker: &str) -> Result<&'a str, ExtractError> {
    let marker_at = locate(document, marker).ok_or(ExtractError::MarkerNotFound {
        document_len: document.len(),
    })?;
    let start = marker_at + marker.len();
    let body = &document[start..];

    let leading = body.len() - body.trim_start().len();
    if !body[leading..].starts_with('{') {
        return Err(unterminated(document, start + leading, 0));
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in body.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                // Only whitespace precedes the first '{', so depth >= 1 here
                depth -= 1;
                if depth == 0 {
                    return Ok(&body[..=i]);
                }
            }
            _ => {}
        }
    }

    Err(unterminated(document, document.len(), depth))
}

/// Parses an extracted literal, keeping the error position for diagnostics
pub fn parse_literal(literal: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(literal.trim()).map_err(|source| {
        let line = source.line();
        let column = source.column();
        let offset = line_column_offset(literal.trim(), line, column);
        ExtractError::JsonSyntax {
            line,
            column,
            snippet: window(literal.trim(), offset, SNIPPET_RADIUS).to_string(),
            source,
        }
    })
}

/// Returns up to `max_chars` characters of `document` starting at `offset`.
///
/// `offset` is clamped to the document and moved back to a character
/// boundary, so any byte position is accepted.
pub fn preview(document: &str, offset: usize, max_chars: usize) -> &str {
    let start = floor_char_boundary(document, offset);
    let rest = &document[start..];
    let end = rest
        .char_indices()
        .nth(max_chars)
        .map_or(rest.len(), |(i, _)| i);
    &rest[..end]
}

/// Text window of `radius` characters on each side of `offset`
fn window(document: &str, offset: usize, radius: usize) -> &str {
    let offset = floor_char_boundary(document, offset);
    let start = document[..offset]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(offset, |(i, _)| i);
    preview(document, start, radius * 2)
}

fn unterminated(document: &str, offset: usize, depth: usize) -> ExtractError {
    ExtractError::UnterminatedLiteral {
        offset,
        depth,
        snippet: window(document, offset, SNIPPET_RADIUS).to_string(),
    }
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Converts serde_json's 1-based line/column into a byte offset
fn line_column_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    line_start + column.saturating_sub(1)
}
