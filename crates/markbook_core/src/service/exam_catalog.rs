//! Exam catalog and dependent-view fan-out.
//!
//! # Responsibility
//! - Own exam create/toggle/delete with referential label snapshots.
//! - Rebuild every derived exam read model after each mutation.
//!
//! # Invariants
//! - (academicYearId, examTypeId, lowercased name) is unique per school.
//! - The derived `ExamMeta` list is recomputed wholesale from the
//!   authoritative exam list, never patched incrementally.
//! - Deleting an exam leaves its result set in storage (orphan state).

use crate::bus::{ChangeBus, ChangeEvent};
use crate::model::catalog::{TypeId, YearId};
use crate::model::exam::{Exam, ExamId, ExamMeta};
use crate::store::keys;
use crate::store::{NamespacedStore, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type ExamResult<T> = Result<T, ExamError>;

/// Validation and persistence errors of the exam catalog.
#[derive(Debug)]
pub enum ExamError {
    MissingField(&'static str),
    UnknownAcademicYear(YearId),
    UnknownExamType(TypeId),
    /// Same name (case-insensitive) already exists for the year/type pair.
    DuplicateExam { name: String },
    NotFound(ExamId),
    Store(StoreError),
}

impl Display for ExamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "exam {field} is required"),
            Self::UnknownAcademicYear(id) => {
                write!(f, "academic year not found: {id}")
            }
            Self::UnknownExamType(id) => write!(f, "exam type not found: {id}"),
            Self::DuplicateExam { name } => write!(
                f,
                "exam `{name}` already exists for this academic year and type"
            ),
            Self::NotFound(id) => write!(f, "exam not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ExamError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Exam profile catalog of the active school.
pub struct ExamCatalog {
    store: Rc<NamespacedStore>,
    bus: Rc<ChangeBus>,
}

impl ExamCatalog {
    pub fn new(store: Rc<NamespacedStore>, bus: Rc<ChangeBus>) -> Self {
        Self { store, bus }
    }

    /// All exams of the active school, in insertion order.
    pub fn get_all(&self) -> ExamResult<Vec<Exam>> {
        Ok(self.store.get(&keys::EXAMS, Vec::new())?)
    }

    /// Exams with the `is_active` flag set.
    pub fn get_active(&self) -> ExamResult<Vec<Exam>> {
        Ok(self.get_all()?.into_iter().filter(|e| e.is_active).collect())
    }

    /// Creates an exam referencing one academic year and one exam type.
    ///
    /// Both references must resolve in their catalogs; their display
    /// labels are snapshotted onto the exam so later catalog edits never
    /// rewrite historical displays.
    pub fn create(
        &self,
        year_id: &YearId,
        type_id: &TypeId,
        name: &str,
        sheet_ref: &str,
    ) -> ExamResult<Exam> {
        let normalized = name.trim();
        if normalized.is_empty() {
            return Err(ExamError::MissingField("name"));
        }

        let years = self.store.get(&keys::ACADEMIC_YEARS, Vec::new())?;
        let year = years
            .iter()
            .find(|y| &y.id == year_id)
            .ok_or_else(|| ExamError::UnknownAcademicYear(year_id.clone()))?;

        let types = self.store.get(&keys::EXAM_TYPES, Vec::new())?;
        let exam_type = types
            .iter()
            .find(|t| &t.id == type_id)
            .ok_or_else(|| ExamError::UnknownExamType(type_id.clone()))?;

        let mut exams = self.get_all()?;
        let duplicate = exams.iter().any(|e| {
            &e.academic_year_id == year_id
                && &e.exam_type_id == type_id
                && e.name.trim().to_lowercase() == normalized.to_lowercase()
        });
        if duplicate {
            return Err(ExamError::DuplicateExam {
                name: normalized.to_string(),
            });
        }

        let exam = Exam::new(
            normalized,
            year_id.clone(),
            type_id.clone(),
            year.name.as_str(),
            exam_type.name.as_str(),
            sheet_ref.trim(),
        );
        exams.push(exam.clone());
        self.save_all(&exams)?;

        info!(
            "event=exam_create module=exam status=ok exam_id={} year_id={year_id} type_id={type_id}",
            exam.id
        );
        Ok(exam)
    }

    /// Flips the visibility flag of one exam.
    pub fn toggle_active(&self, id: &ExamId) -> ExamResult<Exam> {
        let mut exams = self.get_all()?;
        let exam = exams
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| ExamError::NotFound(id.clone()))?;

        exam.is_active = !exam.is_active;
        let updated = exam.clone();
        self.save_all(&exams)?;

        info!(
            "event=exam_toggle module=exam status=ok exam_id={id} is_active={}",
            updated.is_active
        );
        Ok(updated)
    }

    /// Removes one exam profile.
    ///
    /// The exam's result set stays in storage, addressable only by its raw
    /// id; it is not destroyed.
    pub fn delete(&self, id: &ExamId) -> ExamResult<()> {
        let mut exams = self.get_all()?;
        let before = exams.len();
        exams.retain(|e| &e.id != id);
        if exams.len() == before {
            return Err(ExamError::NotFound(id.clone()));
        }

        self.save_all(&exams)?;
        info!("event=exam_delete module=exam status=ok exam_id={id}");
        Ok(())
    }

    /// Rebuilds every derived exam read model from the authoritative
    /// catalog and announces the refresh.
    ///
    /// `auto_select` is forwarded to listeners as a selection hint after
    /// mutations that should focus a particular exam.
    pub fn refresh_dependents(
        &self,
        auto_select: Option<&ExamId>,
    ) -> ExamResult<Vec<ExamMeta>> {
        let exams = self.get_all()?;
        let metas: Vec<ExamMeta> = exams
            .iter()
            .filter(|e| e.is_active)
            .map(ExamMeta::from_exam)
            .collect();

        self.store.set(&keys::EXAM_META, &metas)?;
        self.bus.emit(&ChangeEvent::ExamSelectionRefreshed {
            auto_select: auto_select.cloned(),
        });

        info!(
            "event=exam_refresh_dependents module=exam status=ok entries={}",
            metas.len()
        );
        Ok(metas)
    }

    fn save_all(&self, exams: &Vec<Exam>) -> ExamResult<()> {
        self.store.set(&keys::EXAMS, exams)?;
        self.bus.emit(&ChangeEvent::ExamsChanged);
        self.refresh_dependents(None)?;
        Ok(())
    }
}
