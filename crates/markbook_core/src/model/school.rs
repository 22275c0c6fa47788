//! School (tenant) domain model.
//!
//! # Responsibility
//! - Define the school record owning one namespace partition.
//! - Provide the sentinel id addressing the legacy un-partitioned data.
//!
//! # Invariants
//! - `id` is stable and never reused for another school.
//! - `code` is compared case-insensitively for uniqueness.

use crate::model::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Sentinel school id whose namespace is the legacy un-partitioned prefix.
pub const DEFAULT_SCHOOL_ID: &str = "default";

/// Stable identifier for a school.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolId(String);

impl SchoolId {
    /// Wraps a raw id value read from storage or caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Generates a fresh stable id.
    pub fn generate() -> Self {
        Self(format!("sch_{}", Uuid::new_v4().simple()))
    }

    /// Returns the sentinel id for the legacy namespace.
    pub fn default_school() -> Self {
        Self(DEFAULT_SCHOOL_ID.to_string())
    }

    /// Whether this id addresses the legacy un-partitioned namespace.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_SCHOOL_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SchoolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One isolated logical owner of a partition of the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    /// Short code, unique case-insensitively among schools.
    pub code: String,
    #[serde(default)]
    pub address: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

impl School {
    /// Creates a school profile with a generated stable id.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: SchoolId::generate(),
            name: name.into(),
            code: code.into(),
            address: address.into(),
            created_at: now_epoch_ms(),
        }
    }

    /// Materializes the default school backing the legacy namespace.
    pub fn default_school() -> Self {
        Self {
            id: SchoolId::default_school(),
            name: "Default School".to_string(),
            code: "DEFAULT".to_string(),
            address: String::new(),
            created_at: now_epoch_ms(),
        }
    }
}
