//! Subprocess invocation with an optional timeout.
//!
//! Reader threads drain stdout/stderr (avoiding pipe-buffer deadlocks) and a
//! waiter thread with `mpsc::recv_timeout` bounds the wait; on expiry the
//! child is killed by PID.
//!
//! The error type is deliberately free of tool names so callers can attach
//! their own context when mapping into their error enums.

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug)]
pub struct CaptureOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("executable not found")]
    NotFound,

    #[error("timed out after {}s", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run_capture<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    cwd: Option<&Path>,
    timeout: Option<Duration>,
) -> std::result::Result<CaptureOutput, CaptureError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CaptureError::NotFound
        } else {
            CaptureError::Io(e)
        }
    })?;

    let child_pid = child.id();
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stdout_handle {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });
    let stderr_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stderr_handle {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });

    let wait_result = match timeout {
        None => child.wait(),
        Some(timeout_dur) => {
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                let _ = tx.send(child.wait());
            });
            match rx.recv_timeout(timeout_dur) {
                Ok(result) => result,
                Err(_) => {
                    kill_process(child_pid);
                    return Err(CaptureError::TimedOut {
                        timeout: timeout_dur,
                    });
                }
            }
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();
    let status = wait_result?;

    Ok(CaptureOutput {
        success: status.success(),
        stdout,
        stderr,
    })
}

/// Terminate a process by PID using SIGKILL. Best-effort.
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}
