//! School registry and active-school lifecycle.
//!
//! # Responsibility
//! - Own CRUD over school profiles and the global active-school pointer.
//! - Repair the active-school invariant before any dependent read.
//! - Migrate legacy un-partitioned data into a school namespace.
//!
//! # Invariants
//! - The school list is never empty after any registry read.
//! - The active pointer always resolves to a member of the list.
//! - Neither the last remaining school nor the active school can be
//!   deleted.

use crate::bus::{ChangeBus, ChangeEvent};
use crate::model::school::{School, SchoolId};
use crate::store::keys::{self, RESULTS_KEY_PREFIX, SCHOOL_DATA_PREFIX};
use crate::store::{NamespacedStore, StoreError, StoreResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Fixed logical keys carried over by the legacy data migration; per-exam
/// result sets are enumerated dynamically on top of these.
const LEGACY_KEYS_TO_MIGRATE: &[&str] = &[
    "academic_years",
    "exam_types",
    "exams",
    "exam_results_exams",
];

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Validation and persistence errors of the school registry.
#[derive(Debug)]
pub enum RegistryError {
    BlankName,
    BlankCode,
    DuplicateCode(String),
    NotFound(SchoolId),
    /// Deleting the last remaining school would leave no resolvable
    /// namespace.
    LastSchool,
    /// The active school must be switched away from before deletion.
    ActiveSchool(SchoolId),
    /// The legacy namespace cannot be migrated onto itself.
    MigrationTargetIsLegacy,
    Store(StoreError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "school name is required"),
            Self::BlankCode => write!(f, "school code is required"),
            Self::DuplicateCode(code) => {
                write!(f, "school code `{code}` is already in use")
            }
            Self::NotFound(id) => write!(f, "school not found: {id}"),
            Self::LastSchool => write!(f, "cannot delete the last remaining school"),
            Self::ActiveSchool(id) => write!(
                f,
                "cannot delete the active school {id}; switch to another school first"
            ),
            Self::MigrationTargetIsLegacy => {
                write!(f, "migration target is already the legacy namespace")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Outcome of one legacy-namespace migration run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationSummary {
    pub migrated: u32,
    pub keys_processed: Vec<String>,
}

/// Process-wide singleton service owning school state.
pub struct SchoolRegistry {
    store: Rc<NamespacedStore>,
    bus: Rc<ChangeBus>,
}

impl SchoolRegistry {
    pub fn new(store: Rc<NamespacedStore>, bus: Rc<ChangeBus>) -> Self {
        Self { store, bus }
    }

    /// Returns all registered schools, repairing the invariant first.
    pub fn list(&self) -> RegistryResult<Vec<School>> {
        self.ensure_active_school()?;
        Ok(self.store.get_global(&keys::SCHOOL_LIST, Vec::new())?)
    }

    /// Creates a school profile with a generated id.
    ///
    /// Rejects blank names/codes and case-insensitive duplicate codes.
    pub fn create(
        &self,
        name: &str,
        code: &str,
        address: &str,
    ) -> RegistryResult<School> {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() {
            return Err(RegistryError::BlankName);
        }
        if code.is_empty() {
            return Err(RegistryError::BlankCode);
        }

        let mut schools = self.store.get_global(&keys::SCHOOL_LIST, Vec::new())?;
        if schools
            .iter()
            .any(|s| s.code.trim().eq_ignore_ascii_case(code))
        {
            return Err(RegistryError::DuplicateCode(code.to_string()));
        }

        let school = School::new(name, code, address.trim());
        schools.push(school.clone());
        self.store.set_global(&keys::SCHOOL_LIST, &schools)?;

        info!(
            "event=school_create module=registry status=ok school_id={} code={}",
            school.id, school.code
        );
        Ok(school)
    }

    /// Deletes a school profile.
    ///
    /// The namespace data of the deleted school is preserved in storage;
    /// only the profile disappears from the switcher.
    pub fn delete(&self, id: &SchoolId) -> RegistryResult<()> {
        let active = self.ensure_active_school()?;
        let schools = self.store.get_global(&keys::SCHOOL_LIST, Vec::new())?;

        if !schools.iter().any(|s| &s.id == id) {
            return Err(RegistryError::NotFound(id.clone()));
        }
        if schools.len() == 1 {
            return Err(RegistryError::LastSchool);
        }
        if &active == id {
            return Err(RegistryError::ActiveSchool(id.clone()));
        }

        let remaining: Vec<School> = schools.into_iter().filter(|s| &s.id != id).collect();
        self.store.set_global(&keys::SCHOOL_LIST, &remaining)?;

        info!("event=school_delete module=registry status=ok school_id={id}");
        Ok(())
    }

    /// Switches the active school and notifies both event generations.
    pub fn switch_active(&self, id: &SchoolId) -> RegistryResult<()> {
        self.ensure_active_school()?;
        let schools = self.store.get_global(&keys::SCHOOL_LIST, Vec::new())?;
        if !schools.iter().any(|s| &s.id == id) {
            return Err(RegistryError::NotFound(id.clone()));
        }

        self.store.set_global(&keys::ACTIVE_SCHOOL_ID, id)?;
        self.bus.emit(&ChangeEvent::SchoolChanged {
            school_id: id.clone(),
        });
        self.bus.emit(&ChangeEvent::SchoolChangedLegacy {
            school_id: id.clone(),
        });

        info!("event=school_switch module=registry status=ok school_id={id}");
        Ok(())
    }

    /// Resolved id of the active school.
    pub fn active_id(&self) -> RegistryResult<SchoolId> {
        self.ensure_active_school()
    }

    /// Full record of the active school.
    pub fn active(&self) -> RegistryResult<School> {
        let id = self.ensure_active_school()?;
        let schools = self.store.get_global(&keys::SCHOOL_LIST, Vec::new())?;
        schools
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(RegistryError::NotFound(id))
    }

    /// Repairs and returns the active-school pointer.
    ///
    /// Empty list: materialize the default school. Dangling or missing
    /// pointer: adopt the legacy active-school config when it resolves,
    /// else select the first school in list order. Idempotent and
    /// write-free when the invariant already holds.
    pub fn ensure_active_school(&self) -> RegistryResult<SchoolId> {
        let mut schools = self.store.get_global(&keys::SCHOOL_LIST, Vec::new())?;

        if schools.is_empty() {
            schools.push(School::default_school());
            self.store.set_global(&keys::SCHOOL_LIST, &schools)?;
            warn!("event=active_school_repair module=registry status=ok reason=empty_list");
        }

        if let Some(id) = self.store.get_global_opt(&keys::ACTIVE_SCHOOL_ID)? {
            if schools.iter().any(|s| s.id == id) {
                return Ok(id);
            }
        }

        let adopted = self
            .store
            .get_global_opt(&keys::ACTIVE_SCHOOL_CONFIG)?
            .map(|legacy| legacy.id)
            .filter(|id| schools.iter().any(|s| &s.id == id));
        let resolved = match adopted {
            Some(id) => id,
            None => schools[0].id.clone(),
        };

        self.store.set_global(&keys::ACTIVE_SCHOOL_ID, &resolved)?;
        warn!(
            "event=active_school_repair module=registry status=ok reason=dangling_pointer school_id={resolved}"
        );
        Ok(resolved)
    }

    /// Copies legacy un-partitioned data into the given school's
    /// namespace, skipping logical keys the target already has.
    pub fn migrate_legacy_to(&self, id: &SchoolId) -> RegistryResult<MigrationSummary> {
        if id.is_default() {
            return Err(RegistryError::MigrationTargetIsLegacy);
        }
        let schools = self.store.get_global(&keys::SCHOOL_LIST, Vec::new())?;
        if !schools.iter().any(|s| &s.id == id) {
            return Err(RegistryError::NotFound(id.clone()));
        }

        let target_prefix = format!("{SCHOOL_DATA_PREFIX}{id}_");
        let mut summary = MigrationSummary::default();

        let mut logical_keys: Vec<String> = LEGACY_KEYS_TO_MIGRATE
            .iter()
            .map(|k| (*k).to_string())
            .collect();
        logical_keys.extend(self.legacy_result_keys()?);

        for logical_key in logical_keys {
            if self
                .store
                .copy_legacy_key_to_school(&logical_key, &target_prefix)?
            {
                summary.migrated += 1;
                summary.keys_processed.push(logical_key);
            }
        }

        info!(
            "event=legacy_migration module=registry status=ok school_id={id} migrated={}",
            summary.migrated
        );
        Ok(summary)
    }

    fn legacy_result_keys(&self) -> StoreResult<Vec<String>> {
        self.store.legacy_keys(RESULTS_KEY_PREFIX)
    }
}
