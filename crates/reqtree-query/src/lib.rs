//! Structured queries against external AI CLIs.
//!
//! A [`QueryClient`] sends a prompt plus a declared response shape to an
//! installed AI CLI (Claude Code or Gemini), captures stdout, extracts the
//! JSON payload according to the backend's output convention, and validates
//! it against the shape before handing it back. Nothing here trusts the raw
//! response: every value is either validated or rejected with the full list
//! of path-qualified violations.

mod backend;
mod client;
mod error;
mod process;
mod shape;

pub use backend::Profile;
pub use client::QueryClient;
pub use error::{QueryError, Result};
pub use process::{run_capture, CaptureError, CaptureOutput};
pub use shape::{Field, Shape, Violation};
