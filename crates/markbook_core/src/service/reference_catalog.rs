//! School-scoped reference catalogs (academic years, exam types).
//!
//! # Responsibility
//! - Provide one catalog implementation for both reference lists.
//! - Enforce case-insensitive, trimmed name uniqueness per school.
//!
//! # Invariants
//! - `get_active()` is exactly `get_all()` filtered by the `active` flag.
//! - Deletion never checks exam references; exams stay displayable through
//!   their denormalized label snapshots.

use crate::bus::{ChangeBus, ChangeEvent};
use crate::model::catalog::{AcademicYear, ExamType, ReferenceEntry};
use crate::store::keys::{self, TypedKey};
use crate::store::{NamespacedStore, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Validation and persistence errors of the reference catalogs.
#[derive(Debug)]
pub enum CatalogError {
    BlankName { kind: &'static str },
    DuplicateName { kind: &'static str, name: String },
    NotFound { kind: &'static str, id: String },
    Store(StoreError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName { kind } => write!(f, "{kind} name is required"),
            Self::DuplicateName { kind, name } => {
                write!(f, "{kind} `{name}` already exists")
            }
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Partial update for one catalog entry.
#[derive(Debug, Clone, Default)]
pub struct CatalogPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// Enumerable, activatable reference list scoped to the active school.
pub struct ReferenceCatalog<E: ReferenceEntry> {
    store: Rc<NamespacedStore>,
    bus: Rc<ChangeBus>,
    key: TypedKey<Vec<E>>,
    changed_event: ChangeEvent,
}

/// Academic year catalog of the active school.
pub type AcademicYearCatalog = ReferenceCatalog<AcademicYear>;

/// Exam type catalog of the active school.
pub type ExamTypeCatalog = ReferenceCatalog<ExamType>;

impl ReferenceCatalog<AcademicYear> {
    pub fn academic_years(store: Rc<NamespacedStore>, bus: Rc<ChangeBus>) -> Self {
        Self {
            store,
            bus,
            key: keys::ACADEMIC_YEARS,
            changed_event: ChangeEvent::YearsChanged,
        }
    }
}

impl ReferenceCatalog<ExamType> {
    pub fn exam_types(store: Rc<NamespacedStore>, bus: Rc<ChangeBus>) -> Self {
        Self {
            store,
            bus,
            key: keys::EXAM_TYPES,
            changed_event: ChangeEvent::ExamTypesChanged,
        }
    }
}

impl<E: ReferenceEntry> ReferenceCatalog<E> {
    /// All entries of the active school, in insertion order.
    pub fn get_all(&self) -> CatalogResult<Vec<E>> {
        Ok(self.store.get(&self.key, Vec::new())?)
    }

    /// Entries with the `active` flag set; no other filtering.
    pub fn get_active(&self) -> CatalogResult<Vec<E>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(ReferenceEntry::is_active)
            .collect())
    }

    /// Creates an entry from a trimmed, duplicate-checked name.
    pub fn create(&self, name: &str) -> CatalogResult<E> {
        let normalized = name.trim();
        if normalized.is_empty() {
            return Err(CatalogError::BlankName {
                kind: E::kind_label(),
            });
        }

        let mut entries = self.get_all()?;
        if Self::name_taken(&entries, normalized, None) {
            return Err(CatalogError::DuplicateName {
                kind: E::kind_label(),
                name: normalized.to_string(),
            });
        }

        let entry = E::with_name(normalized.to_string());
        entries.push(entry.clone());
        self.save(&entries)?;

        info!(
            "event=catalog_create module=catalog status=ok kind={} id={} name={}",
            E::kind_label(),
            entry.id(),
            entry.name()
        );
        Ok(entry)
    }

    /// Applies a partial update; renames run the duplicate check against
    /// every other entry.
    pub fn update(&self, id: &E::Id, patch: CatalogPatch) -> CatalogResult<E> {
        let mut entries = self.get_all()?;

        if let Some(name) = &patch.name {
            let normalized = name.trim();
            if normalized.is_empty() {
                return Err(CatalogError::BlankName {
                    kind: E::kind_label(),
                });
            }
            if Self::name_taken(&entries, normalized, Some(id)) {
                return Err(CatalogError::DuplicateName {
                    kind: E::kind_label(),
                    name: normalized.to_string(),
                });
            }
        }

        let entry = entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: E::kind_label(),
                id: id.to_string(),
            })?;

        if let Some(name) = patch.name {
            entry.set_name(name.trim().to_string());
        }
        if let Some(active) = patch.active {
            entry.set_active(active);
        }
        let updated = entry.clone();

        self.save(&entries)?;
        Ok(updated)
    }

    /// Flips the `active` flag of one entry.
    pub fn toggle_active(&self, id: &E::Id) -> CatalogResult<E> {
        let mut entries = self.get_all()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: E::kind_label(),
                id: id.to_string(),
            })?;

        entry.set_active(!entry.is_active());
        let updated = entry.clone();
        self.save(&entries)?;
        Ok(updated)
    }

    /// Removes one entry. Exams referencing it keep their label snapshots.
    pub fn delete(&self, id: &E::Id) -> CatalogResult<()> {
        let mut entries = self.get_all()?;
        let before = entries.len();
        entries.retain(|e| e.id() != id);
        if entries.len() == before {
            return Err(CatalogError::NotFound {
                kind: E::kind_label(),
                id: id.to_string(),
            });
        }

        self.save(&entries)?;
        info!(
            "event=catalog_delete module=catalog status=ok kind={} id={id}",
            E::kind_label()
        );
        Ok(())
    }

    fn save(&self, entries: &Vec<E>) -> CatalogResult<()> {
        self.store.set(&self.key, entries)?;
        self.bus.emit(&self.changed_event);
        Ok(())
    }

    fn name_taken(entries: &[E], candidate: &str, except: Option<&E::Id>) -> bool {
        let candidate = candidate.to_lowercase();
        entries.iter().any(|e| {
            except.map_or(true, |id| e.id() != id)
                && e.name().trim().to_lowercase() == candidate
        })
    }
}
