//! Error types for armnet
//!
//! Every failure is surfaced at the call that triggered the remote operation.
//! Nothing here retries or recovers; errors reported by the transport are
//! passed through unchanged.

use thiserror::Error;

/// Result type alias using the armnet [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// armnet error types
#[derive(Error, Debug)]
pub enum Error {
    /// The backend refused the payload (bad CIDR, unknown SKU, quota, ...)
    #[error("Request rejected by the backend: {code}: {message}")]
    ValidationRejected { code: String, message: String },

    #[error("Resource not found: {kind} {name}")]
    NotFound { kind: String, name: String },

    /// Concurrent modification or duplicate name, detected by the backend
    #[error("Resource conflict: {code}: {message}")]
    Conflict { code: String, message: String },

    #[error("Transport error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Transport { status: Option<u16>, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid resource id: {0}")]
    InvalidResourceId(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationRejected { .. })
    }

    /// HTTP status associated with this error, when one is known
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ValidationRejected { .. } => Some(400),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::Transport { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Outcome of one element of a batch operation.
///
/// Batch streams never fail as a whole; each input gets exactly one item.
#[derive(Debug)]
pub struct BatchItem<T> {
    /// The id (or name, for batch create) the item was submitted under
    pub key: String,
    pub result: Result<T>,
}

impl<T> BatchItem<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Format an error for display on the command line.
/// Keeps messages short and never echoes raw response bodies.
pub fn format_arm_error(error: &Error) -> String {
    match error {
        Error::ValidationRejected { code, .. } => {
            format!("Invalid request ({code}). Check your parameters.")
        }
        Error::NotFound { kind, name } => format!("{kind} '{name}' not found."),
        Error::Conflict { .. } => {
            "Resource conflict. The resource may already exist or be in use.".to_string()
        }
        Error::Credential(_) => {
            "Authentication failed. Run 'az login' or set ARM_ACCESS_TOKEN.".to_string()
        }
        Error::Transport { status: Some(401), .. } => {
            "Authentication failed. Run 'az login' or set ARM_ACCESS_TOKEN.".to_string()
        }
        Error::Transport { status: Some(403), .. } => {
            "Permission denied. Check your role assignments.".to_string()
        }
        Error::Transport { status: Some(429), .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        Error::Transport {
            status: Some(500..=599),
            ..
        } => "Service temporarily unavailable. Please try again.".to_string(),
        Error::Transport { .. } | Error::Http(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        other => {
            let text = other.to_string();
            let sanitized: String = text
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(80)
                .collect();
            if sanitized.len() < text.len() {
                format!("{sanitized}...")
            } else {
                sanitized
            }
        }
    }
}
