//! Prompt builders for the AI-backed operations.

use crate::requirement::{FeatureType, Requirement};
use std::path::Path;

/// Prompt for extracting requirement records from a spreadsheet. Relies on
/// the xlsx MCP server configured by workspace init to read the document.
pub fn extraction_prompt(doc_path: &Path, filter: &str) -> String {
    format!(
        "Read the spreadsheet at {doc} using the xlsx tool and extract the \
         requirement rows matching: {filter}.\n\
         For each matching row, return an object with:\n\
         - iteration: the iteration label, e.g. \"24.10.1\"\n\
         - name: the requirement name\n\
         - deadline: the deadline as YYYY-MM-DD (if the cell only has \
         month-day, keep it as MM-DD)\n\
         - context: any http(s) links in the row, each as an object with \
         type \"link\", a label and the url as content; omit the field when \
         the row has no links\n\
         Return every matching row; return an empty array if none match.",
        doc = doc_path.display()
    )
}

/// Prompt for suggesting a git branch name for a requirement.
pub fn branch_prompt(requirement: &Requirement, feature_type: FeatureType) -> String {
    format!(
        "Suggest a git branch name for this work item.\n\
         Name: {name}\n\
         Id: {id}\n\
         Rules:\n\
         - format: {ftype}/{id}/<short-description>\n\
         - the short description is kebab-case, at most 5 words\n\
         - translate non-English names into English first\n\
         - use only lowercase letters, digits and hyphens in the description",
        name = requirement.name,
        id = requirement.id,
        ftype = feature_type.as_str()
    )
}
