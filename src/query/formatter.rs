use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::Record;

/// Evidence text used when a query matched nothing
pub const NO_RESULT_MARKER: &str = "(no result)";

/// Prefix of the evidence text used when every attempt failed
pub const ERROR_MARKER: &str = "(error occurred)";

/// How the answer generator should treat a piece of evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceState {
    Empty,
    Error,
    Populated,
}

impl EvidenceState {
    pub fn classify(evidence: &str) -> Self {
        let trimmed = evidence.trim();
        if trimmed.is_empty() || trimmed == "[]" || trimmed == NO_RESULT_MARKER {
            EvidenceState::Empty
        } else if trimmed.starts_with(ERROR_MARKER) {
            EvidenceState::Error
        } else {
            EvidenceState::Populated
        }
    }

    /// Short status line appended under the evidence in the answer prompt
    pub fn status_line(self) -> &'static str {
        match self {
            EvidenceState::Empty => "NO data found in the database.",
            EvidenceState::Error => "An ERROR occurred while fetching data.",
            EvidenceState::Populated => "Valid data found above.",
        }
    }
}

impl fmt::Display for EvidenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceState::Empty => write!(f, "empty"),
            EvidenceState::Error => write!(f, "error"),
            EvidenceState::Populated => write!(f, "populated"),
        }
    }
}

/// Textual rendering of a query outcome handed to the answer generator.
/// Never empty: it is either rendered records or one of the markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    text: String,
    state: EvidenceState,
}

impl Evidence {
    /// Render records one JSON object per line, keeping at most `limit`
    /// of them (`0` keeps all). The state comes from the records, never
    /// from their rendered text.
    pub fn from_records(records: &[Record], limit: usize) -> Self {
        if records.is_empty() {
            return Self::no_result();
        }

        let shown = if limit == 0 {
            records.len()
        } else {
            limit.min(records.len())
        };

        let mut lines: Vec<String> = records[..shown]
            .iter()
            .map(|record| Value::Object(record.clone()).to_string())
            .collect();

        let omitted = records.len() - shown;
        if omitted > 0 {
            lines.push(format!("({} more records omitted)", omitted));
        }

        Self {
            text: lines.join("\n"),
            state: EvidenceState::Populated,
        }
    }

    pub fn no_result() -> Self {
        Self {
            text: NO_RESULT_MARKER.to_string(),
            state: EvidenceState::Empty,
        }
    }

    pub fn error(detail: &str) -> Self {
        let detail = detail.trim();
        let text = if detail.is_empty() {
            ERROR_MARKER.to_string()
        } else {
            format!("{} {}", ERROR_MARKER, detail)
        };
        Self {
            text,
            state: EvidenceState::Error,
        }
    }

    /// Wrap pre-rendered evidence text, classifying it by its markers;
    /// blank text becomes the no-result marker
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match EvidenceState::classify(&text) {
            EvidenceState::Empty => Self::no_result(),
            state => Self { text, state },
        }
    }

    pub fn state(&self) -> EvidenceState {
        self.state
    }

    /// The failure detail carried by error evidence
    pub fn error_detail(&self) -> Option<&str> {
        match self.state {
            EvidenceState::Error => self
                .text
                .trim_start()
                .strip_prefix(ERROR_MARKER)
                .map(str::trim)
                .filter(|rest| !rest.is_empty()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
