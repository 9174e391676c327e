//! NuGet config normalization
//!
//! Rewrites `nuget.config` files that carry license banners or broken comment
//! headers in front of the `<configuration>` element into well-formed XML:
//!
//! - stray prose before `<configuration>` is dropped and the canonical
//!   declaration is prepended
//! - a comment whose `<!--` opener went missing (lines starting with a bare
//!   `*`) is rebuilt as declaration + `<!--` + original lines + `-->`
//!
//! Normalizing already normalized text returns it unchanged.

use crate::error::NormalizeError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Declaration line every normalized file starts with
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Opening tag of the root element
static ROOT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<configuration(?:\s[^>]*)?/?>").unwrap());

/// An XML declaration with any trailing whitespace
static DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\?xml[^>]*\?>\s*").unwrap());

/// A line consisting of exactly one XML declaration
static DECLARATION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<\?xml[^>]*\?>$").unwrap());

/// Which repair was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeAction {
    /// Structure was already canonical (only BOM or line endings may differ)
    Canonical,
    /// Text before `<configuration>` was discarded
    StrippedPreamble,
    /// A comment header missing its opener was rebuilt
    RepairedHeader,
}

impl fmt::Display for NormalizeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeAction::Canonical => write!(f, "re-encoded"),
            NormalizeAction::StrippedPreamble => write!(f, "stripped preamble"),
            NormalizeAction::RepairedHeader => write!(f, "repaired comment header"),
        }
    }
}

/// Normalized text together with the repair that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub action: NormalizeAction,
}

/// Normalize raw config text
///
/// Fails with [`NormalizeError::NoRootMarker`] when there is no
/// `<configuration>` element to anchor to.
pub fn normalize(raw: &str) -> Result<String, NormalizeError> {
    normalize_detailed(raw).map(|n| n.text)
}

/// Normalize raw config text and report which repair was applied
pub fn normalize_detailed(raw: &str) -> Result<Normalized, NormalizeError> {
    let text = prepare(raw);
    let marker = ROOT_MARKER_RE
        .find(&text)
        .ok_or(NormalizeError::NoRootMarker)?;
    let (preamble, body) = text.split_at(marker.start());

    if is_canonical_preamble(preamble) {
        return Ok(Normalized {
            text,
            action: NormalizeAction::Canonical,
        });
    }

    if let Some(comment) = orphaned_comment_lines(preamble) {
        let body = DECLARATION_RE.replace_all(body, "");
        let mut out = String::with_capacity(text.len() + 64);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        out.push_str(COMMENT_OPEN);
        out.push('\n');
        for line in &comment {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(COMMENT_CLOSE);
        out.push('\n');
        out.push_str(&body);
        return Ok(Normalized {
            text: out,
            action: NormalizeAction::RepairedHeader,
        });
    }

    let body = DECLARATION_RE.replace_all(body, "");
    Ok(Normalized {
        text: format!("{}\n{}", XML_DECLARATION, body),
        action: NormalizeAction::StrippedPreamble,
    })
}

/// Drop a UTF-8 BOM and convert CRLF to LF
fn prepare(raw: &str) -> String {
    raw.strip_prefix('\u{feff}')
        .unwrap_or(raw)
        .replace("\r\n", "\n")
}

/// Declaration on the first line, then nothing or one closed comment
fn is_canonical_preamble(preamble: &str) -> bool {
    let (first, rest) = preamble.split_once('\n').unwrap_or((preamble, ""));
    if !DECLARATION_LINE_RE.is_match(first.trim_end()) {
        return false;
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return true;
    }
    match rest
        .strip_prefix(COMMENT_OPEN)
        .and_then(|r| r.strip_suffix(COMMENT_CLOSE))
    {
        Some(inner) => !inner.contains(COMMENT_OPEN) && !inner.contains(COMMENT_CLOSE),
        None => false,
    }
}

/// Comment lines to keep when the preamble has lines starting with a bare `*`
///
/// Everything before the first such line is dropped. Declarations and stray
/// comment delimiters are removed from the kept lines; lines without them are
/// kept byte for byte.
fn orphaned_comment_lines(preamble: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = preamble.lines().collect();
    let first = lines
        .iter()
        .position(|line| line.trim_start().starts_with('*'))?;

    let mut kept: Vec<String> = lines[first..]
        .iter()
        .filter_map(|line| {
            let cleaned = strip_delimiters(&DECLARATION_RE.replace_all(line, ""));
            if cleaned == *line {
                Some(cleaned)
            } else if cleaned.trim().is_empty() {
                None
            } else {
                Some(cleaned.trim_end().to_string())
            }
        })
        .collect();

    while kept.last().is_some_and(|line| line.trim().is_empty()) {
        kept.pop();
    }
    Some(kept)
}

fn strip_delimiters(line: &str) -> String {
    let mut line = line.to_string();
    while line.contains(COMMENT_OPEN) || line.contains(COMMENT_CLOSE) {
        line = line.replace(COMMENT_OPEN, "").replace(COMMENT_CLOSE, "");
    }
    line
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// File content changed (or would change in dry-run mode)
    Rewritten { action: NormalizeAction },
    /// File was already normalized
    Unchanged,
    /// File could not be normalized and was left untouched
    Failed { message: String },
}

/// Result for one config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Result of normalizing a batch of files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeSummary {
    /// Whether files were left unwritten
    pub dry_run: bool,
    /// Per-file results, in input order
    pub files: Vec<FileOutcome>,
}

impl NormalizeSummary {
    pub fn rewritten(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Rewritten { .. }))
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Unchanged)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Normalize one file in place
///
/// The file is only written when its content changes and `dry_run` is off.
pub fn normalize_file(path: &Path, dry_run: bool) -> Result<FileStatus, NormalizeError> {
    let raw = fs::read_to_string(path).map_err(|e| NormalizeError::read_error(path, e))?;
    let normalized = normalize_detailed(&raw)?;

    if normalized.text == raw {
        return Ok(FileStatus::Unchanged);
    }
    if !dry_run {
        fs::write(path, &normalized.text).map_err(|e| NormalizeError::write_error(path, e))?;
    }
    Ok(FileStatus::Rewritten {
        action: normalized.action,
    })
}

/// Normalize every file, recording failures instead of stopping
pub fn normalize_files(paths: &[PathBuf], dry_run: bool) -> NormalizeSummary {
    let mut summary = NormalizeSummary {
        dry_run,
        files: Vec::with_capacity(paths.len()),
    };

    for path in paths {
        let status = match normalize_file(path, dry_run) {
            Ok(status) => {
                debug!(path = %path.display(), ?status, "normalized");
                status
            }
            Err(e) => {
                warn!("[ERROR] {}: {}", path.display(), e);
                FileStatus::Failed {
                    message: e.to_string(),
                }
            }
        };
        summary.files.push(FileOutcome {
            path: path.clone(),
            status,
        });
    }

    summary
}
