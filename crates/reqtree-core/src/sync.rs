//! Spreadsheet sync: ask an AI CLI to extract requirement rows, normalize
//! them, and append the ones not already present.

use crate::error::{ReqtreeError, Result};
use crate::prompts;
use crate::requirement::{ContextInfo, Requirement};
use crate::store::RequirementStore;
use chrono::{Datelike, NaiveDate, Utc};
use reqtree_query::{Field, QueryClient, Shape};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Rows the AI extracted from the document.
    pub parsed: usize,
    /// Rows actually appended after de-duplication. Zero with a non-zero
    /// `parsed` means everything was already present, which is success.
    pub appended: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedRecord {
    pub iteration: String,
    pub name: String,
    pub deadline: String,
    /// Reference links found in the row, if any.
    #[serde(default)]
    pub context: Vec<ContextInfo>,
}

fn record_shape() -> Shape {
    Shape::array(Shape::Object(vec![
        Field::required("iteration", Shape::String),
        Field::required("name", Shape::String),
        Field::required("deadline", Shape::String),
        Field::optional(
            "context",
            Shape::array(Shape::Object(vec![
                Field::required("type", Shape::literal("link")),
                Field::required("label", Shape::String),
                Field::required("content", Shape::String),
            ])),
        ),
    ]))
}

pub struct SyncEngine<'a> {
    store: &'a RequirementStore,
    client: &'a QueryClient,
}

impl<'a> SyncEngine<'a> {
    pub fn new(store: &'a RequirementStore, client: &'a QueryClient) -> Self {
        Self { store, client }
    }

    /// Extract rows from `doc_path` matching `filter` and append the new
    /// ones in a single store write.
    pub fn run(&self, doc_path: &Path, filter: &str) -> Result<SyncReport> {
        let prompt = prompts::extraction_prompt(doc_path, filter);
        let records: Vec<ParsedRecord> = self.client.query_as(&prompt, &record_shape())?;
        let parsed = records.len();
        if records.is_empty() {
            return Ok(SyncReport { parsed, appended: 0 });
        }

        let year = Utc::now().date_naive().year();
        let incoming = records
            .into_iter()
            .map(|r| normalize_record(r, year))
            .collect::<Result<Vec<_>>>()?;

        let appended = self.store.update(|reqs| {
            let new = merge_new_requirements(reqs, incoming);
            let count = new.len();
            reqs.extend(new);
            Ok(count)
        })?;

        info!(parsed, appended, doc = %doc_path.display(), "sync complete");
        Ok(SyncReport { parsed, appended })
    }
}

/// Turn an extracted row into a full requirement: generated id, normalized
/// deadline, validated links, unfinished, no worktrees.
pub fn normalize_record(record: ParsedRecord, current_year: i32) -> Result<Requirement> {
    let deadline = parse_deadline(&record.deadline, current_year)?;
    for ctx in &record.context {
        ctx.validate()?;
    }
    let mut requirement = Requirement::new(record.iteration, record.name, deadline);
    requirement.context = record.context;
    Ok(requirement)
}

/// Accept canonical `YYYY-MM-DD`, or `MM-DD` resolved to `current_year`.
fn parse_deadline(raw: &str, current_year: i32) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Some((m, d)) = raw.split_once('-') {
        if let (Ok(month), Ok(day)) = (m.parse::<u32>(), d.parse::<u32>()) {
            if let Some(date) = NaiveDate::from_ymd_opt(current_year, month, day) {
                return Ok(date);
            }
        }
    }
    Err(ReqtreeError::InvalidDeadline(raw.to_string()))
}

/// Return the incoming requirements not already present, keyed by
/// `iteration + name`. Duplicates within the incoming batch collapse too.
pub fn merge_new_requirements(
    existing: &[Requirement],
    incoming: Vec<Requirement>,
) -> Vec<Requirement> {
    let mut seen: HashSet<(String, String)> = existing
        .iter()
        .map(|r| (r.iteration.clone(), r.name.clone()))
        .collect();
    incoming
        .into_iter()
        .filter(|r| seen.insert((r.iteration.clone(), r.name.clone())))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
