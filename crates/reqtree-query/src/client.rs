use crate::backend::Profile;
use crate::error::{QueryError, Result};
use crate::process::run_capture;
use crate::shape::Shape;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// A configured handle for querying one AI CLI.
#[derive(Debug, Clone)]
pub struct QueryClient {
    profile: Profile,
    program: String,
    timeout: Option<Duration>,
    cwd: Option<PathBuf>,
}

impl QueryClient {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            program: profile.default_program().to_string(),
            timeout: None,
            cwd: None,
        }
    }

    /// Override the executable name or path.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the CLI from this directory. Backends that read files relative
    /// to the working directory (Gemini with MCP servers) need this.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Send `prompt` and return the payload, validated against `shape`.
    pub fn query(&self, prompt: &str, shape: &Shape) -> Result<Value> {
        let args = self.profile.build_args(prompt, shape);
        debug!(program = %self.program, profile = ?self.profile, "invoking ai cli");

        let output = run_capture(&self.program, &args, self.cwd.as_deref(), self.timeout)
            .map_err(|e| QueryError::from_capture(&self.program, e))?;
        if !output.success {
            let message = pick_error_message(&output.stderr, &output.stdout);
            return Err(QueryError::ToolFailed {
                tool: self.program.clone(),
                message,
            });
        }

        let payload = self.profile.extract_payload(&self.program, &output.stdout)?;
        let violations = shape.validate(&payload);
        if !violations.is_empty() {
            return Err(QueryError::SchemaValidation(violations));
        }
        Ok(payload)
    }

    /// [`query`](Self::query), then deserialize into `T`.
    pub fn query_as<T: DeserializeOwned>(&self, prompt: &str, shape: &Shape) -> Result<T> {
        let payload = self.query(prompt, shape)?;
        serde_json::from_value(payload).map_err(|e| QueryError::InvalidResponse {
            tool: self.program.clone(),
            message: format!("payload did not deserialize: {e}"),
        })
    }
}

/// Choose the most useful line to surface from a failed invocation.
fn pick_error_message(stderr: &str, stdout: &str) -> String {
    let last_line = |text: &str| {
        text.lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    };
    last_line(stderr)
        .or_else(|| last_line(stdout))
        .unwrap_or_else(|| "exited with a non-zero status and no output".to_string())
}
