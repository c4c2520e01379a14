//! Backend profiles for the supported AI CLIs.
//!
//! The two CLIs disagree on both input and output conventions: Claude Code
//! takes a system prompt and wraps its answer in a JSON envelope, while
//! Gemini takes one combined prompt and wraps the answer in a markdown
//! fenced code block. A [`Profile`] captures both sides of that contract.

use crate::error::{QueryError, Result};
use crate::shape::Shape;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// `claude --print --output-format json`: stdout is a metadata envelope
    /// whose `result` field holds the answer text.
    Claude,
    /// `gemini -p <prompt> --yolo`: stdout carries a ```json fenced block,
    /// or occasionally bare JSON.
    Gemini,
}

impl Profile {
    pub fn default_program(&self) -> &'static str {
        match self {
            Profile::Claude => "claude",
            Profile::Gemini => "gemini",
        }
    }

    /// Build the argv for one query.
    pub(crate) fn build_args(&self, prompt: &str, shape: &Shape) -> Vec<String> {
        let schema = serde_json::to_string_pretty(&shape.to_schema()).unwrap_or_default();
        match self {
            Profile::Claude => {
                let system_prompt = format!(
                    "You must respond with valid JSON that matches this schema: {schema}. \
                     Only output the JSON, no markdown code blocks or explanations."
                );
                vec![
                    "--print".to_string(),
                    "--output-format".to_string(),
                    "json".to_string(),
                    "--system-prompt".to_string(),
                    system_prompt,
                    prompt.to_string(),
                ]
            }
            Profile::Gemini => {
                let full_prompt = format!(
                    "{prompt}\n\nYou must respond with valid JSON wrapped in a markdown code block:\n\n```json\n<your JSON here>\n```\n\nSchema:\n{schema}"
                );
                vec!["-p".to_string(), full_prompt, "--yolo".to_string()]
            }
        }
    }

    /// Extract the JSON payload from captured stdout.
    pub(crate) fn extract_payload(&self, tool: &str, stdout: &str) -> Result<Value> {
        match self {
            Profile::Claude => {
                let envelope: Value =
                    serde_json::from_str(stdout).map_err(|e| QueryError::InvalidResponse {
                        tool: tool.to_string(),
                        message: format!("envelope parse failed: {e}"),
                    })?;
                let result = envelope
                    .get("result")
                    .and_then(Value::as_str)
                    .ok_or_else(|| QueryError::InvalidResponse {
                        tool: tool.to_string(),
                        message: "envelope is missing the \"result\" field".to_string(),
                    })?;
                // The result text should itself be JSON; a plain-text answer
                // is passed through as a string and left to shape validation.
                Ok(serde_json::from_str(result)
                    .unwrap_or_else(|_| Value::String(result.to_string())))
            }
            Profile::Gemini => {
                if let Some(block) = extract_fenced_block(stdout) {
                    return serde_json::from_str(block).map_err(|e| QueryError::InvalidResponse {
                        tool: tool.to_string(),
                        message: format!("fenced block parse failed: {e}"),
                    });
                }
                serde_json::from_str(stdout.trim()).map_err(|e| QueryError::InvalidResponse {
                    tool: tool.to_string(),
                    message: format!("expected fenced or bare JSON: {e}"),
                })
            }
        }
    }
}

/// Return the content of the first ``` fenced block, if any.
fn extract_fenced_block(output: &str) -> Option<&str> {
    let start = output.find("```")?;
    let after_fence = &output[start + 3..];
    // Skip an optional language tag up to the first newline.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Field, Shape};
    use serde_json::json;

    #[test]
    fn claude_args_carry_schema_in_system_prompt() {
        let shape = Shape::Object(vec![Field::required("branchName", Shape::String)]);
        let args = Profile::Claude.build_args("name a branch", &shape);
        assert_eq!(args[0], "--print");
        assert!(args[4].contains("branchName"));
        assert!(args[4].contains("no markdown"));
        assert_eq!(args[5], "name a branch");
    }

    #[test]
    fn gemini_args_embed_fencing_instruction() {
        let args = Profile::Gemini.build_args("extract rows", &Shape::array(Shape::String));
        assert_eq!(args[0], "-p");
        assert!(args[1].contains("```json"));
        assert_eq!(args[2], "--yolo");
    }

    #[test]
    fn claude_envelope_unwrapped() {
        let stdout = r#"{"type":"result","result":"{\"branchName\":\"feat/r1/login\"}","cost_usd":0.01}"#;
        let value = Profile::Claude.extract_payload("claude", stdout).unwrap();
        assert_eq!(value, json!({ "branchName": "feat/r1/login" }));
    }

    #[test]
    fn claude_plain_text_result_passes_through_as_string() {
        let stdout = r#"{"result":"not json at all"}"#;
        let value = Profile::Claude.extract_payload("claude", stdout).unwrap();
        assert_eq!(value, json!("not json at all"));
    }

    #[test]
    fn claude_missing_result_field_rejected() {
        let err = Profile::Claude
            .extract_payload("claude", r#"{"type":"result"}"#)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidResponse { .. }));
    }

    #[test]
    fn gemini_fenced_block_preferred() {
        let stdout = "Here you go:\n```json\n[{\"name\":\"Login\"}]\n```\nDone.";
        let value = Profile::Gemini.extract_payload("gemini", stdout).unwrap();
        assert_eq!(value, json!([{ "name": "Login" }]));
    }

    #[test]
    fn gemini_untagged_fence_accepted() {
        let stdout = "```\n{\"ok\":true}\n```";
        let value = Profile::Gemini.extract_payload("gemini", stdout).unwrap();
        assert_eq!(value, json!({ "ok": true }));
    }

    #[test]
    fn gemini_bare_json_fallback() {
        let value = Profile::Gemini.extract_payload("gemini", "  [1,2,3] ").unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn gemini_garbage_rejected() {
        let err = Profile::Gemini
            .extract_payload("gemini", "I could not parse the file")
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidResponse { .. }));
    }
}
