//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store access into admin-facing APIs per concern.
//! - Keep callers decoupled from key layout and encoding details.
//!
//! # Invariants
//! - Services reach the physical store only through `NamespacedStore`.
//! - Every mutation is followed by its domain change notification.

pub mod exam_catalog;
pub mod reference_catalog;
pub mod result_store;
pub mod school_registry;
