//! Domain models for schools, reference catalogs, exams and result sets.
//!
//! # Responsibility
//! - Define the canonical persisted shapes used by core business logic.
//! - Keep wire field names aligned with the pre-existing stored data
//!   (camelCase external schema naming).
//!
//! # Invariants
//! - Every entity is identified by a stable prefixed string id.
//! - The school id `default` addresses the legacy un-partitioned namespace.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod catalog;
pub mod exam;
pub mod result;
pub mod school;

/// Current wall-clock time in epoch milliseconds.
///
/// Clamps to zero for clocks set before the epoch instead of panicking.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
