//! Error taxonomy shared by every stage of an export.
//!
//! Upstream calls report failures as [`HttpFailure`]. The pipeline never shows
//! those to a user directly: they are funneled through [`classify`], which
//! turns them into one of the [`ExportError`] variants with a message the
//! caller can print as-is.

use serde::Deserialize;
use std::fmt;

/// Reason code the YouTube Data API reports when the daily quota is spent.
const QUOTA_EXCEEDED_REASON: &str = "quotaExceeded";

/// A user-facing failure that aborts an export.
///
/// Every variant carries a complete, human-actionable message; callers are
/// expected to display it directly rather than a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// The API project ran out of quota for the day.
    #[error("{0}")]
    QuotaExceeded(String),
    /// The spreadsheet could not be read or written with the configured service account.
    #[error("{0}")]
    PermissionDenied(String),
    /// The target worksheet does not exist in the spreadsheet.
    #[error("{0}")]
    SheetNotFound(String),
    /// Anything else, including channels that could not be found.
    #[error("{0}")]
    Generic(String),
}

impl ExportError {
    pub(crate) fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }
}

/// A failed call to an upstream HTTP API.
///
/// `status` is absent when the request never produced a response (connection
/// failures, timeouts) or when the response body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: Option<u16>,
    pub body: String,
}

impl HttpFailure {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    /// A failure that happened before (or instead of) an HTTP response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: message.into(),
        }
    }

    /// Machine-readable reason from a Google API error payload.
    ///
    /// Google APIs wrap errors as `{"error": {"errors": [{"reason": "..."}]}}`.
    /// Only the first entry is considered. A body that isn't shaped like that
    /// yields an empty string.
    pub fn reason(&self) -> String {
        serde_json::from_str::<ErrorEnvelope>(&self.body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.errors.into_iter().next())
            .and_then(|item| item.reason)
            .unwrap_or_default()
    }
}

impl From<reqwest::Error> for HttpFailure {
    fn from(e: reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            body: e.to_string(),
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "request failed with status {status}: {}", self.body),
            None => write!(f, "request failed: {}", self.body),
        }
    }
}

impl std::error::Error for HttpFailure {}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    reason: Option<String>,
}

/// Maps an upstream failure onto the export error taxonomy.
///
/// `context` names what the pipeline was doing (e.g. `"resolving channel id"`)
/// and ends up in the message of [`ExportError::Generic`].
pub fn classify(failure: &HttpFailure, context: &str) -> ExportError {
    let reason = failure.reason();

    if reason == QUOTA_EXCEEDED_REASON {
        return ExportError::QuotaExceeded(
            "YouTube API quota exceeded. Reduce max videos, wait for quota reset, \
             or use a new Google Cloud project and API key."
                .to_string(),
        );
    }

    let status = failure
        .status
        .map_or_else(|| "unknown".to_string(), |s| s.to_string());
    let reason = if reason.is_empty() { "unknown" } else { &reason };
    ExportError::Generic(format!(
        "API error while {context}. Status {status}. Reason {reason}"
    ))
}
