//! Subprocess invocation for git and other external tools.
//!
//! The actual capture-with-timeout machinery lives in `reqtree_query`; this
//! wrapper maps its neutral errors into [`ReqtreeError`] with the tool name
//! attached.

use crate::error::{ReqtreeError, Result};
use reqtree_query::CaptureError;
use std::path::Path;
use std::time::Duration;

pub use reqtree_query::CaptureOutput as CmdOutput;

pub fn run_capture(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<CmdOutput> {
    reqtree_query::run_capture(program, args, cwd, timeout).map_err(|e| match e {
        CaptureError::NotFound => ReqtreeError::ToolNotFound {
            tool: program.to_string(),
        },
        CaptureError::TimedOut { timeout } => ReqtreeError::ToolTimeout {
            tool: program.to_string(),
            seconds: timeout.as_secs(),
        },
        CaptureError::Io(e) => ReqtreeError::Io(e),
    })
}

/// Pick the most useful line from a failed command's stderr: the last
/// non-empty line, which git usually makes the actual diagnosis.
pub fn best_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "command failed with no error output".to_string())
}
