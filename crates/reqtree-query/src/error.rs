use crate::shape::Violation;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("'{tool}' not found: ensure it is installed and on PATH")]
    ToolNotFound { tool: String },

    #[error("'{tool}' timed out after {}s", .timeout.as_secs())]
    Timeout { tool: String, timeout: Duration },

    #[error("'{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("'{tool}' returned a response that is not valid JSON: {message}")]
    InvalidResponse { tool: String, message: String },

    #[error("response failed schema validation:\n{}", format_violations(.0))]
    SchemaValidation(Vec<Violation>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    /// Attach the tool name to a capture failure.
    pub(crate) fn from_capture(tool: &str, err: crate::process::CaptureError) -> Self {
        use crate::process::CaptureError;
        match err {
            CaptureError::NotFound => QueryError::ToolNotFound {
                tool: tool.to_string(),
            },
            CaptureError::TimedOut { timeout } => QueryError::Timeout {
                tool: tool.to_string(),
                timeout,
            },
            CaptureError::Io(e) => QueryError::Io(e),
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, QueryError>;
