//! Reference catalog entries: academic years and exam types.
//!
//! # Responsibility
//! - Define the two school-scoped, enumerable, activatable reference lists.
//! - Expose one entry contract so both lists share a single catalog
//!   implementation.
//!
//! # Invariants
//! - Entry names are unique case-insensitively (trimmed) within a school.
//! - Deactivation never deletes; `active` is the only visibility flag.

use crate::model::now_epoch_ms;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an academic year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearId(String);

impl YearId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn generate() -> Self {
        Self(format!("yr_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for YearId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for an exam type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn generate() -> Self {
        Self(format!("et_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Academic session such as `2025-26`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: YearId,
    pub name: String,
    pub active: bool,
    pub created_at: i64,
}

/// Exam category such as `Half Yearly` or `Annual`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamType {
    pub id: TypeId,
    pub name: String,
    pub active: bool,
    pub created_at: i64,
}

/// Shared contract of an enumerable, activatable reference list entry.
///
/// Both catalogs persist as a whole list under one logical key, so the
/// catalog service only needs identity, display name and the active flag.
pub trait ReferenceEntry: Clone + Serialize + DeserializeOwned {
    /// Typed id of this entry kind.
    type Id: Clone + Eq + Display;

    /// Creates a new active entry from an already-normalized name.
    fn with_name(name: String) -> Self;

    fn id(&self) -> &Self::Id;
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);

    /// Human-readable kind label used in validation messages.
    fn kind_label() -> &'static str;
}

impl ReferenceEntry for AcademicYear {
    type Id = YearId;

    fn with_name(name: String) -> Self {
        Self {
            id: YearId::generate(),
            name,
            active: true,
            created_at: now_epoch_ms(),
        }
    }

    fn id(&self) -> &YearId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn kind_label() -> &'static str {
        "academic year"
    }
}

impl ReferenceEntry for ExamType {
    type Id = TypeId;

    fn with_name(name: String) -> Self {
        Self {
            id: TypeId::generate(),
            name,
            active: true,
            created_at: now_epoch_ms(),
        }
    }

    fn id(&self) -> &TypeId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn kind_label() -> &'static str {
        "exam type"
    }
}
