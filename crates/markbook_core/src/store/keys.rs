//! Logical key registry and namespace prefixes.
//!
//! # Responsibility
//! - Pair every well-known logical key with the type stored under it.
//! - Define the physical prefix constants of the partitioning scheme.
//!
//! # Invariants
//! - Global keys are always resolved under the legacy prefix.
//! - `results_<examId>` keys are the only dynamically-named logical keys.

use crate::model::catalog::{AcademicYear, ExamType};
use crate::model::exam::{Exam, ExamId, ExamMeta};
use crate::model::result::ResultSet;
use crate::model::school::{School, SchoolId};
use std::borrow::Cow;
use std::marker::PhantomData;

/// Fixed prefix of the legacy un-partitioned namespace; also hosts every
/// global (unscoped) key.
pub const LEGACY_PREFIX: &str = "mhm_v2_";

/// Prefix stem of per-school namespaces: `school_<id>_`.
pub const SCHOOL_DATA_PREFIX: &str = "school_";

/// A logical key bound to the type persisted under it.
///
/// Replaces the original's untyped string keys with a compile-time schema:
/// reading `EXAMS` can only ever decode to `Vec<Exam>`.
#[derive(Debug, Clone)]
pub struct TypedKey<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    pub fn owned(name: String) -> Self {
        Self {
            name: Cow::Owned(name),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Global: the list of registered schools.
pub const SCHOOL_LIST: TypedKey<Vec<School>> = TypedKey::new("school_list");

/// Global: pointer to the active school.
pub const ACTIVE_SCHOOL_ID: TypedKey<SchoolId> = TypedKey::new("active_school_id");

/// Global, legacy: full active-school record written by the previous
/// single-school scheme; read only as a migration fallback.
pub const ACTIVE_SCHOOL_CONFIG: TypedKey<School> = TypedKey::new("active_school_config");

/// Scoped: academic year catalog of the active school.
pub const ACADEMIC_YEARS: TypedKey<Vec<AcademicYear>> = TypedKey::new("academic_years");

/// Scoped: exam type catalog of the active school.
pub const EXAM_TYPES: TypedKey<Vec<ExamType>> = TypedKey::new("exam_types");

/// Scoped: exam catalog of the active school.
pub const EXAMS: TypedKey<Vec<Exam>> = TypedKey::new("exams");

/// Scoped: derived exam selector list consumed by result lookup.
pub const EXAM_META: TypedKey<Vec<ExamMeta>> = TypedKey::new("exam_results_exams");

/// Stem of per-exam result set keys.
pub const RESULTS_KEY_PREFIX: &str = "results_";

/// Scoped: the result set of one exam.
pub fn results(exam_id: &ExamId) -> TypedKey<ResultSet> {
    TypedKey::owned(format!("{RESULTS_KEY_PREFIX}{exam_id}"))
}
