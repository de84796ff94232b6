//! Setup document parsing
//!
//! A setup document is a JSON object using the wire keys declared in
//! [`crate::schema`]. Text fields are trimmed and blank values count as
//! unset. The embedded `satis_conf` string is itself a JSON document and is
//! decoded here so syntax errors in it surface with a position too.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::settings::{CandidateConfig, SyncModeChoice};

/// Label used in errors for the outer document
pub const SETUP_DOCUMENT: &str = "setup document";
/// Label used in errors for the embedded repository list
pub const SATIS_CONFIG: &str = "satis config";

/// Widest source excerpt shown in a parse error
const MAX_EXCERPT_WIDTH: usize = 80;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfigDocument {
    packagist_sync: Option<bool>,
    dist_sync_mode: Option<String>,
    git_path: Option<String>,
    git_prefix: Option<String>,
    license_personal: Option<bool>,
    license: Option<String>,
    satis_conf: Option<String>,
}

/// Parse a raw setup document into a candidate configuration
pub fn parse_document(raw: &str) -> Result<CandidateConfig, ParseError> {
    let value = decode_json(raw, SETUP_DOCUMENT)?;
    if !value.is_object() {
        return Err(ParseError {
            label: SETUP_DOCUMENT.to_string(),
            line: 1,
            column: 1,
            headline: format!("Parse error in {} on line 1", SETUP_DOCUMENT),
            detail: "expected a JSON object".to_string(),
        });
    }

    // Second pass over the text keeps positions for type mismatches
    let doc: RawConfigDocument =
        serde_json::from_str(raw).map_err(|e| parse_error(raw, SETUP_DOCUMENT, &e))?;

    let extra_repositories = match trimmed(doc.satis_conf) {
        Some(text) => Some(decode_json(&text, SATIS_CONFIG)?),
        None => None,
    };

    Ok(CandidateConfig {
        packagist_sync: doc.packagist_sync.unwrap_or(true),
        sync_mode: SyncModeChoice::from_input(doc.dist_sync_mode.as_deref()),
        mirror_path: trimmed(doc.git_path),
        mirror_prefix: trimmed(doc.git_prefix),
        license: trimmed(doc.license),
        personal_use: doc.license_personal.unwrap_or(false),
        extra_repositories,
    })
}

/// Decode arbitrary JSON text, annotating failures with `label`
pub fn decode_json(text: &str, label: &str) -> Result<Value, ParseError> {
    serde_json::from_str(text).map_err(|e| parse_error(text, label, &e))
}

/// Interpret a raw request body as document text
pub fn decode_utf8<'a>(bytes: &'a [u8], label: &str) -> Result<&'a str, ParseError> {
    std::str::from_utf8(bytes).map_err(|e| {
        let offset = e.valid_up_to();
        let prefix = String::from_utf8_lossy(&bytes[..offset]);
        let line_start = prefix.rfind('\n').map_or(0, |idx| idx + 1);
        let line = prefix.matches('\n').count() + 1;

        ParseError {
            label: label.to_string(),
            line,
            column: prefix[line_start..].chars().count() + 1,
            headline: format!("Parse error in {} on line {}", label, line),
            detail: format!("invalid UTF-8 sequence at byte {}", offset),
        }
    })
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_error(source: &str, label: &str, err: &serde_json::Error) -> ParseError {
    let line = err.line();
    let byte_column = err.column();

    // serde_json appends the position to its message, it goes in the headline instead
    let message = err.to_string();
    let message = message
        .strip_suffix(&format!(" at line {} column {}", line, byte_column))
        .unwrap_or(&message)
        .to_string();

    let source_line = line.checked_sub(1).and_then(|idx| source.lines().nth(idx));
    let column = match source_line {
        Some(text) => char_column(text, byte_column),
        None => byte_column,
    };

    let mut detail = Vec::new();
    if let Some(text) = source_line {
        let (excerpt, caret) = excerpt(text, column);
        detail.push(excerpt);
        detail.push(caret);
    }
    detail.push(message);

    ParseError {
        label: label.to_string(),
        line,
        column,
        headline: format!("Parse error in {} on line {}", label, line.max(1)),
        detail: detail.join("\n"),
    }
}

/// serde_json reports byte columns; map one onto a 1-based char column of `text`
fn char_column(text: &str, byte_column: usize) -> usize {
    let mut offset = byte_column.saturating_sub(1).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    text[..offset].chars().count() + 1
}

/// The offending source line and a caret under char `column` (1-based)
fn excerpt(text: &str, column: usize) -> (String, String) {
    let chars: Vec<char> = text.chars().collect();
    let column = column.clamp(1, chars.len().max(1));

    let start = column.saturating_sub(MAX_EXCERPT_WIDTH / 2 + 1);
    let end = (start + MAX_EXCERPT_WIDTH).min(chars.len());
    let window: String = chars[start..end].iter().collect();

    let caret = format!("{}^", "-".repeat(column - 1 - start));
    (window, caret)
}
