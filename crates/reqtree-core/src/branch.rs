//! Branch name derivation: ask an AI CLI first, fall back to a
//! deterministic slug. The function never fails; a bad or missing AI
//! answer degrades to the slug.

use crate::git::validate_branch_name;
use crate::prompts;
use crate::requirement::{FeatureType, Requirement};
use reqtree_query::{Field, QueryClient, Shape};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct BranchSuggestion {
    #[serde(rename = "branchName")]
    branch_name: String,
}

/// Derive a branch name for a requirement. With a client, the AI suggestion
/// is used when it parses and passes ref-name validation; anything else
/// falls back to `<featureType>/<id>/<kebab(name)>`.
pub fn suggest_branch_name(
    client: Option<&QueryClient>,
    requirement: &Requirement,
    feature_type: FeatureType,
) -> String {
    if let Some(client) = client {
        let shape = Shape::Object(vec![Field::required("branchName", Shape::String)]);
        let prompt = prompts::branch_prompt(requirement, feature_type);
        match client.query_as::<BranchSuggestion>(&prompt, &shape) {
            Ok(suggestion) if validate_branch_name(&suggestion.branch_name).is_ok() => {
                return suggestion.branch_name;
            }
            Ok(suggestion) => {
                debug!(branch = %suggestion.branch_name, "ai branch name failed validation, using slug");
            }
            Err(e) => {
                debug!(error = %e, "ai branch suggestion failed, using slug");
            }
        }
    }
    fallback_branch_name(requirement, feature_type)
}

pub fn fallback_branch_name(requirement: &Requirement, feature_type: FeatureType) -> String {
    let slug = kebab(&requirement.name);
    let slug = if slug.is_empty() { "work" } else { &slug };
    format!("{}/{}/{}", feature_type.as_str(), requirement.id, slug)
}

/// ASCII-lowercase kebab slug: alphanumerics kept, every other run of
/// characters collapses to a single hyphen.
fn kebab(value: &str) -> String {
    let mut out = String::new();
    let mut last_hyphen = true;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    out.trim_end_matches('-').to_string()
}
