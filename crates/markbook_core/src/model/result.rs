//! Result set domain model.
//!
//! # Responsibility
//! - Define the per-exam result set and its student records.
//! - Carry the publish flag gating public visibility.
//!
//! # Invariants
//! - `published` is the only gate between admin and public surfaces;
//!   toggling it never touches `data`.
//! - A result set survives deletion of its exam (orphan state).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pass/fail outcome of one student record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Pass,
    Fail,
}

/// One student's row in a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    /// Roll identifier; matched trimmed and case-insensitively on lookup.
    pub roll_no: String,
    pub name: String,
    /// Per-subject marks keyed by subject name.
    #[serde(default)]
    pub marks: BTreeMap<String, u32>,
    pub total_marks: u32,
    pub grade: String,
    pub status: ResultStatus,
    /// Optional secondary lookup key (date of birth as entered).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    /// Exam display label embedded by older import paths; used as a
    /// display fallback when no exam metadata resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_label: Option<String>,
}

impl StudentResult {
    /// Creates a passing record with no marks; callers fill in fields.
    pub fn new(roll_no: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            roll_no: roll_no.into(),
            name: name.into(),
            marks: BTreeMap::new(),
            total_marks: 0,
            grade: String::new(),
            status: ResultStatus::Pass,
            dob: None,
            exam_label: None,
        }
    }

    /// Recomputes `total_marks` as the sum over `marks`.
    pub fn recompute_total(&mut self) {
        self.total_marks = self.marks.values().sum();
    }
}

/// All results of one exam plus publish/sync metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    /// Whether the public lookup surface may see this set.
    pub published: bool,
    /// Last data replacement time in epoch milliseconds.
    pub synced_at: i64,
    pub data: Vec<StudentResult>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self {
            published: false,
            synced_at: 0,
            data: Vec::new(),
        }
    }
}
