//! Ordered text matchers that pull a location and message out of tool output.
//!
//! Each matcher is independent and returns `None` when its shape is absent.
//! [`MATCHERS`] is applied in order and the first hit wins.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use trail_core::{ErrorRecord, ErrorSource, Location};

use crate::snippet::{display_path, read_snippet, resolve_path};

/// Fields recovered from free text; anything not found stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMatch {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: Option<String>,
}

pub type Matcher = fn(&str) -> Option<TextMatch>;

/// Matchers in priority order.
pub const MATCHERS: &[(&str, Matcher)] = &[
    ("stack-trace", match_stack_trace),
    ("colon-message", match_colon_message),
    ("module-not-found", match_module_not_found),
];

struct Patterns {
    location_header: Regex,
    frame: Regex,
    error_line: Regex,
    colon_message: Regex,
    module_not_found: Regex,
}

fn build_patterns() -> Option<Patterns> {
    Some(Patterns {
        // `/abs/path/file.js:12` or `src/file.js:12:5` alone on a line.
        location_header: Regex::new(
            r"(?m)^(?P<file>(?:[A-Za-z]:)?[^\s:()][^:()\n]*\.[A-Za-z0-9]+):(?P<line>\d+)(?::(?P<col>\d+))?\s*$",
        )
        .ok()?,
        // `    at fn (file.js:1:2)` or `    at file.js:1:2`
        frame: Regex::new(
            r"(?m)^\s*at\s+(?:[^\n(]*?\()?(?P<file>[^()\s]+?):(?P<line>\d+):(?P<col>\d+)\)?\s*$",
        )
        .ok()?,
        error_line: Regex::new(r"(?m)^\s*(?P<msg>(?:[A-Z][A-Za-z]*)?Error\b.*?)\s*$").ok()?,
        colon_message: Regex::new(
            r"(?m)^\s*(?P<msg>(?:[A-Z][A-Za-z]*)?Error: .+?)(?:\s+at\s+(?P<file>[^\s()]+?):(?P<line>\d+):(?P<col>\d+))?\s*$",
        )
        .ok()?,
        module_not_found: Regex::new(r"Cannot find module '(?P<module>[^']+)'").ok()?,
    })
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS.get_or_init(build_patterns).as_ref()
}

fn is_runtime_internal(file: &str) -> bool {
    file.starts_with("node:") || file.starts_with("internal/")
}

fn parse_num(caps: &regex::Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

/// Location-bearing stack-trace shape: a `file:line[:col]` header, or the
/// first user-code `at … (file:line:col)` frame.
pub fn match_stack_trace(text: &str) -> Option<TextMatch> {
    let p = patterns()?;

    let located = p
        .location_header
        .captures(text)
        .filter(|caps| !is_runtime_internal(&caps["file"]))
        .or_else(|| {
            p.frame
                .captures_iter(text)
                .find(|caps| !is_runtime_internal(&caps["file"]))
        })?;

    let message = p
        .error_line
        .captures(text)
        .map(|caps| caps["msg"].to_string());

    Some(TextMatch {
        file: Some(located["file"].to_string()),
        line: parse_num(&located, "line"),
        column: parse_num(&located, "col"),
        message,
    })
}

/// `XxxError: message` with an optional trailing `at file:line:col`.
pub fn match_colon_message(text: &str) -> Option<TextMatch> {
    let caps = patterns()?.colon_message.captures(text)?;
    Some(TextMatch {
        file: caps.name("file").map(|m| m.as_str().to_string()),
        line: parse_num(&caps, "line"),
        column: parse_num(&caps, "col"),
        message: Some(caps["msg"].to_string()),
    })
}

/// `Cannot find module '<name>'`.
pub fn match_module_not_found(text: &str) -> Option<TextMatch> {
    let caps = patterns()?.module_not_found.captures(text)?;
    Some(TextMatch {
        message: Some(format!("Cannot find module '{}'", &caps["module"])),
        ..TextMatch::default()
    })
}

/// Apply [`MATCHERS`] in order; the first match decides every field.
pub fn first_match(text: &str) -> Option<(&'static str, TextMatch)> {
    MATCHERS
        .iter()
        .find_map(|(name, matcher)| matcher(text).map(|m| (*name, m)))
}

/// Normalize free-form failure output into exactly one record.
///
/// Unmatched fields default to `fallback_file`, line 1, column 1, and the
/// first non-empty line of `text` as message.
pub fn extract_from_text(
    text: &str,
    root: &Path,
    fallback_file: &Path,
    source: ErrorSource,
) -> ErrorRecord {
    let matched = match first_match(text) {
        Some((name, m)) => {
            tracing::debug!(matcher = name, "Matched tool output");
            m
        }
        None => TextMatch::default(),
    };

    let file = matched
        .file
        .as_deref()
        .map(|f| resolve_path(root, f))
        .unwrap_or_else(|| resolve_path(root, &fallback_file.to_string_lossy()));
    let message = matched
        .message
        .unwrap_or_else(|| first_line(text).to_string());

    let location = Location::new(display_path(root, &file), matched.line, matched.column);
    let snippet = read_snippet(&file, location.line);
    ErrorRecord::new(&message, location, source).with_snippet(snippet)
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}
