//! School-scoped view over the physical key-value namespace.
//!
//! # Responsibility
//! - Resolve the active namespace prefix on every access.
//! - Encode/decode values to the JSON textual encoding.
//! - Emit keyed change notifications after every successful write.
//!
//! # Invariants
//! - Scoped and global accessors never observe each other's keys unless the
//!   active school is the default one (legacy namespace).
//! - A failed write never emits a notification.
//! - Decode failures degrade to the caller's default and are logged.

use crate::bus::{ChangeBus, ChangeEvent};
use crate::store::keys::{self, TypedKey, LEGACY_PREFIX, SCHOOL_DATA_PREFIX};
use crate::store::{KvBackend, StoreError, StoreResult};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::rc::Rc;

/// The single component permitted to touch the physical store.
///
/// Shared via `Rc` and injected into every service built on top of it.
pub struct NamespacedStore {
    backend: Box<dyn KvBackend>,
    bus: Rc<ChangeBus>,
}

impl NamespacedStore {
    pub fn new(backend: Box<dyn KvBackend>, bus: Rc<ChangeBus>) -> Self {
        Self { backend, bus }
    }

    /// The change bus this store notifies.
    pub fn bus(&self) -> &Rc<ChangeBus> {
        &self.bus
    }

    /// Resolves the physical prefix for the current context.
    ///
    /// Order: active-school pointer, then the legacy active-school config
    /// (migration path), then the fixed legacy prefix. A pointer at the
    /// default school addresses the legacy namespace directly.
    pub fn active_prefix(&self) -> String {
        if let Some(id) = self.read_global_quietly(&keys::ACTIVE_SCHOOL_ID) {
            if id.is_default() {
                return LEGACY_PREFIX.to_string();
            }
            return format!("{SCHOOL_DATA_PREFIX}{id}_");
        }

        if let Some(school) = self.read_global_quietly(&keys::ACTIVE_SCHOOL_CONFIG) {
            if !school.id.is_default() {
                return format!("{SCHOOL_DATA_PREFIX}{}_", school.id);
            }
        }

        LEGACY_PREFIX.to_string()
    }

    /// Reads a scoped key, falling back to `default` when the key is
    /// missing or its stored value is corrupt.
    pub fn get<T: DeserializeOwned>(&self, key: &TypedKey<T>, default: T) -> StoreResult<T> {
        Ok(self.get_opt(key)?.unwrap_or(default))
    }

    /// Reads a scoped key; `None` when missing or corrupt.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &TypedKey<T>) -> StoreResult<Option<T>> {
        let physical = format!("{}{}", self.active_prefix(), key.name());
        self.read_physical(&physical)
    }

    /// Writes a scoped key and emits its keyed change notification.
    pub fn set<T: Serialize>(&self, key: &TypedKey<T>, value: &T) -> StoreResult<()> {
        let physical = format!("{}{}", self.active_prefix(), key.name());
        self.write_physical(key.name(), &physical, value)?;
        self.bus.emit(&ChangeEvent::KeyUpdated {
            key: key.name().to_string(),
        });
        Ok(())
    }

    /// Removes a scoped key.
    pub fn remove<T>(&self, key: &TypedKey<T>) -> StoreResult<()> {
        let physical = format!("{}{}", self.active_prefix(), key.name());
        self.backend.remove(&physical)
    }

    /// Reads a global (unscoped) key with a fallback default.
    pub fn get_global<T: DeserializeOwned>(
        &self,
        key: &TypedKey<T>,
        default: T,
    ) -> StoreResult<T> {
        Ok(self.get_global_opt(key)?.unwrap_or(default))
    }

    /// Reads a global (unscoped) key; `None` when missing or corrupt.
    pub fn get_global_opt<T: DeserializeOwned>(
        &self,
        key: &TypedKey<T>,
    ) -> StoreResult<Option<T>> {
        let physical = format!("{LEGACY_PREFIX}{}", key.name());
        self.read_physical(&physical)
    }

    /// Writes a global key and emits its keyed change notification.
    pub fn set_global<T: Serialize>(&self, key: &TypedKey<T>, value: &T) -> StoreResult<()> {
        let physical = format!("{LEGACY_PREFIX}{}", key.name());
        self.write_physical(key.name(), &physical, value)?;
        self.bus.emit(&ChangeEvent::GlobalKeyUpdated {
            key: key.name().to_string(),
        });
        Ok(())
    }

    /// Removes a global key.
    pub fn remove_global<T>(&self, key: &TypedKey<T>) -> StoreResult<()> {
        let physical = format!("{LEGACY_PREFIX}{}", key.name());
        self.backend.remove(&physical)
    }

    /// Enumerates logical keys of the active namespace starting with
    /// `logical_prefix`.
    pub fn keys_in_namespace(&self, logical_prefix: &str) -> StoreResult<Vec<String>> {
        let namespace = self.active_prefix();
        let physical_prefix = format!("{namespace}{logical_prefix}");
        let keys = self.backend.keys_with_prefix(&physical_prefix)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&namespace).map(str::to_string))
            .collect())
    }

    /// Enumerates logical keys present in the legacy namespace starting
    /// with `logical_prefix`. Used by the legacy data migration.
    pub(crate) fn legacy_keys(&self, logical_prefix: &str) -> StoreResult<Vec<String>> {
        let physical_prefix = format!("{LEGACY_PREFIX}{logical_prefix}");
        let keys = self.backend.keys_with_prefix(&physical_prefix)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(LEGACY_PREFIX).map(str::to_string))
            .collect())
    }

    /// Copies the raw value of one legacy logical key into the target
    /// school's namespace without re-encoding, skipping occupied targets.
    ///
    /// Returns whether a copy happened. Used by the legacy data migration.
    pub(crate) fn copy_legacy_key_to_school(
        &self,
        logical_key: &str,
        school_id_prefix: &str,
    ) -> StoreResult<bool> {
        let source = format!("{LEGACY_PREFIX}{logical_key}");
        let target = format!("{school_id_prefix}{logical_key}");

        let Some(raw) = self.backend.read(&source)? else {
            return Ok(false);
        };
        if self.backend.read(&target)?.is_some() {
            return Ok(false);
        }

        self.backend.write(&target, &raw)?;
        Ok(true)
    }

    fn read_physical<T: DeserializeOwned>(&self, physical: &str) -> StoreResult<Option<T>> {
        let Some(raw) = self.backend.read(physical)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(
                    "event=kv_decode module=store status=error error_code=corrupt_value key={physical} fallback=default error={err}"
                );
                Ok(None)
            }
        }
    }

    /// Like `read_physical` but also swallows backend errors; used only by
    /// prefix resolution, which must never fail.
    fn read_global_quietly<T: DeserializeOwned>(&self, key: &TypedKey<T>) -> Option<T> {
        let physical = format!("{LEGACY_PREFIX}{}", key.name());
        match self.read_physical(&physical) {
            Ok(value) => value,
            Err(err) => {
                error!(
                    "event=kv_read module=store status=error error_code=prefix_lookup_failed key={physical} error={err}"
                );
                None
            }
        }
    }

    fn write_physical<T: Serialize>(
        &self,
        logical: &str,
        physical: &str,
        value: &T,
    ) -> StoreResult<()> {
        let encoded = serde_json::to_string(value).map_err(|err| StoreError::Data {
            key: logical.to_string(),
            message: err.to_string(),
        })?;

        if let Err(err) = self.backend.write(physical, &encoded) {
            let code = match &err {
                StoreError::Quota { .. } => "quota_exceeded",
                _ => "write_failed",
            };
            error!(
                "event=kv_write module=store status=error error_code={code} key={physical} error={err}"
            );
            return Err(err);
        }
        Ok(())
    }
}
