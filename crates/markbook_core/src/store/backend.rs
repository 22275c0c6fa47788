//! Physical key-value backends.
//!
//! # Responsibility
//! - Persist raw textual values under physical keys.
//! - Enforce the optional capacity budget before any write lands.
//!
//! # Invariants
//! - A write that would exceed the capacity budget leaves the store
//!   untouched.
//! - Prefix enumeration returns keys in ascending lexical order.

use crate::db::{open_db, open_db_in_memory};
use crate::store::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

/// Raw persistence contract of the flat physical namespace.
///
/// Implementations take `&self`; interior mutability keeps the store layer
/// shareable across services within one process.
pub trait KvBackend {
    fn read(&self, physical_key: &str) -> StoreResult<Option<String>>;
    fn write(&self, physical_key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, physical_key: &str) -> StoreResult<()>;
    /// Enumerates physical keys starting with `physical_prefix`.
    fn keys_with_prefix(&self, physical_prefix: &str) -> StoreResult<Vec<String>>;
}

/// SQLite-backed physical store over the migrated `kv_entries` table.
pub struct SqliteKvBackend {
    conn: Connection,
    capacity_chars: Option<u64>,
}

impl SqliteKvBackend {
    /// Wraps an already-bootstrapped connection with no capacity budget.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            capacity_chars: None,
        }
    }

    /// Wraps a connection and caps total stored characters (keys plus
    /// values), mimicking the bounded quota of the original runtime.
    pub fn with_capacity(conn: Connection, capacity_chars: u64) -> Self {
        Self {
            conn,
            capacity_chars: Some(capacity_chars),
        }
    }

    /// Opens a database file, applies migrations and wraps the connection.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens an in-memory database, applies migrations and wraps it.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn used_chars_excluding(&self, physical_key: &str) -> StoreResult<u64> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(k) + LENGTH(v)), 0)
             FROM kv_entries
             WHERE k <> ?1;",
            [physical_key],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as u64)
    }
}

impl KvBackend for SqliteKvBackend {
    fn read(&self, physical_key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT v FROM kv_entries WHERE k = ?1;",
                [physical_key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, physical_key: &str, value: &str) -> StoreResult<()> {
        if let Some(capacity) = self.capacity_chars {
            let incoming = (physical_key.chars().count() + value.chars().count()) as u64;
            if self.used_chars_excluding(physical_key)? + incoming > capacity {
                return Err(StoreError::Quota {
                    key: physical_key.to_string(),
                });
            }
        }

        self.conn.execute(
            "INSERT INTO kv_entries (k, v) VALUES (?1, ?2)
             ON CONFLICT(k) DO UPDATE SET v = excluded.v;",
            params![physical_key, value],
        )?;
        Ok(())
    }

    fn remove(&self, physical_key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE k = ?1;", [physical_key])?;
        Ok(())
    }

    fn keys_with_prefix(&self, physical_prefix: &str) -> StoreResult<Vec<String>> {
        // substr comparison instead of LIKE: prefixes legitimately contain
        // `_`, which LIKE would treat as a wildcard.
        let mut stmt = self.conn.prepare(
            "SELECT k FROM kv_entries
             WHERE substr(k, 1, length(?1)) = ?1
             ORDER BY k ASC;",
        )?;
        let mut rows = stmt.query([physical_prefix])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get::<_, String>(0)?);
        }
        Ok(keys)
    }
}

/// In-memory physical store for tests and ephemeral embedding.
#[derive(Default)]
pub struct MemoryKvBackend {
    entries: RefCell<BTreeMap<String, String>>,
    capacity_chars: Option<u64>,
}

impl MemoryKvBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps total stored characters (keys plus values).
    pub fn with_capacity(capacity_chars: u64) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            capacity_chars: Some(capacity_chars),
        }
    }

    fn used_chars_excluding(&self, physical_key: &str) -> u64 {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != physical_key)
            .map(|(k, v)| (k.chars().count() + v.chars().count()) as u64)
            .sum()
    }
}

impl KvBackend for MemoryKvBackend {
    fn read(&self, physical_key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(physical_key).cloned())
    }

    fn write(&self, physical_key: &str, value: &str) -> StoreResult<()> {
        if let Some(capacity) = self.capacity_chars {
            let incoming = (physical_key.chars().count() + value.chars().count()) as u64;
            if self.used_chars_excluding(physical_key) + incoming > capacity {
                return Err(StoreError::Quota {
                    key: physical_key.to_string(),
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(physical_key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, physical_key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(physical_key);
        Ok(())
    }

    fn keys_with_prefix(&self, physical_prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .borrow()
            .keys()
            .filter(|k| k.starts_with(physical_prefix))
            .cloned()
            .collect())
    }
}
