//! Exam domain model and its derived selector read model.
//!
//! # Responsibility
//! - Define the exam record referencing both reference catalogs.
//! - Define the `ExamMeta` read model rebuilt by dependent-view refresh.
//!
//! # Invariants
//! - `year_label`/`type_label` are snapshots taken at creation time; later
//!   catalog edits never rewrite them.
//! - (academicYearId, examTypeId, lowercased name) is unique per school.

use crate::model::catalog::{TypeId, YearId};
use crate::model::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an exam.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(String);

impl ExamId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn generate() -> Self {
        Self(format!("ex_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One exam profile within a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: ExamId,
    pub name: String,
    pub academic_year_id: YearId,
    pub exam_type_id: TypeId,
    /// Display label of the academic year, snapshotted at creation.
    pub year_label: String,
    /// Display label of the exam type, snapshotted at creation.
    pub type_label: String,
    /// External spreadsheet reference used by result import tooling.
    #[serde(default)]
    pub sheet_ref: String,
    pub is_active: bool,
    pub created_at: i64,
}

impl Exam {
    /// Creates an active exam with a generated stable id and label
    /// snapshots resolved by the caller.
    pub fn new(
        name: impl Into<String>,
        academic_year_id: YearId,
        exam_type_id: TypeId,
        year_label: impl Into<String>,
        type_label: impl Into<String>,
        sheet_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: ExamId::generate(),
            name: name.into(),
            academic_year_id,
            exam_type_id,
            year_label: year_label.into(),
            type_label: type_label.into(),
            sheet_ref: sheet_ref.into(),
            is_active: true,
            created_at: now_epoch_ms(),
        }
    }

    /// Selector label shown wherever an exam must be picked:
    /// `<name> (<type> - <year>)`.
    pub fn display_label(&self) -> String {
        format!("{} ({} - {})", self.name, self.type_label, self.year_label)
    }
}

/// Derived selector entry consumed by result lookup and exam pickers.
///
/// Rebuilt wholesale from the authoritative exam list on every exam
/// mutation; never patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamMeta {
    pub exam_id: ExamId,
    pub display_label: String,
    pub academic_year_id: YearId,
    pub exam_type_id: TypeId,
}

impl ExamMeta {
    /// Projects one active exam into its selector entry.
    pub fn from_exam(exam: &Exam) -> Self {
        Self {
            exam_id: exam.id.clone(),
            display_label: exam.display_label(),
            academic_year_id: exam.academic_year_id.clone(),
            exam_type_id: exam.exam_type_id.clone(),
        }
    }
}
