use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Provenance of a detected error.
///
/// Serialized as a tag string: `lint:<rule>`, `syntax-check`,
/// `runtime-trace` or `user-provided`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ErrorSource {
    /// Static analysis diagnostic; `rule` is the tool's rule id when it gave one.
    Lint { rule: Option<String> },
    SyntaxCheck,
    RuntimeTrace,
    UserProvided,
}

impl ErrorSource {
    pub fn lint(rule: Option<&str>) -> Self {
        Self::Lint {
            rule: rule.filter(|r| !r.is_empty()).map(ToOwned::to_owned),
        }
    }

    /// Name of the detector behind this source, without the rule suffix.
    pub fn tool(&self) -> &'static str {
        match self {
            Self::Lint { .. } => "lint",
            Self::SyntaxCheck => "syntax-check",
            Self::RuntimeTrace => "runtime-trace",
            Self::UserProvided => "user-provided",
        }
    }
}

impl std::fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lint { rule } => write!(f, "lint:{}", rule.as_deref().unwrap_or("unknown")),
            other => f.write_str(other.tool()),
        }
    }
}

impl From<ErrorSource> for String {
    fn from(source: ErrorSource) -> Self {
        source.to_string()
    }
}

impl TryFrom<String> for ErrorSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "syntax-check" => Ok(Self::SyntaxCheck),
            "runtime-trace" => Ok(Self::RuntimeTrace),
            "user-provided" => Ok(Self::UserProvided),
            "lint" => Ok(Self::Lint { rule: None }),
            other => match other.strip_prefix("lint:") {
                Some("unknown") => Ok(Self::Lint { rule: None }),
                Some(rule) => Ok(Self::lint(Some(rule))),
                None => Err(format!("unknown error source '{other}'")),
            },
        }
    }
}

/// Position of an error, relative to the invocation root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Location with line/column clamped to the 1-based minimum.
    pub fn new(file_path: impl Into<String>, line: Option<u32>, column: Option<u32>) -> Self {
        Self {
            file_path: file_path.into(),
            line: line.unwrap_or(1).max(1),
            column: column.unwrap_or(1).max(1),
        }
    }
}

/// Canonical normalized representation of one detected problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub message: String,
    pub location: Location,
    pub source: ErrorSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl ErrorRecord {
    /// Build a record; the message is trimmed and never left empty.
    pub fn new(message: &str, location: Location, source: ErrorSource) -> Self {
        let trimmed = message.trim();
        let message = if trimmed.is_empty() {
            format!("Unspecified {} error", source.tool())
        } else {
            trimmed.to_string()
        };
        Self {
            message,
            location,
            source,
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: Option<String>) -> Self {
        self.snippet = snippet
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Record synthesized from an error string the user typed in.
    ///
    /// Carries line/column 0 since nothing was located.
    pub fn user_provided(message: &str, file_path: Option<&str>) -> Self {
        Self::new(
            message,
            Location {
                file_path: file_path.unwrap_or_default().to_string(),
                line: 0,
                column: 0,
            },
            ErrorSource::UserProvided,
        )
    }
}

/// Render a record as `<message> (<source>) at <file>:<line>:<column>`.
pub fn render_error_record(record: &ErrorRecord) -> String {
    format!(
        "{} ({}) at {}:{}:{}",
        record.message,
        record.source,
        record.location.file_path,
        record.location.line,
        record.location.column
    )
}

/// Output format for CLI responses
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
