//! Core domain logic for Markbook.
//! This crate is the single source of truth for multi-school storage
//! invariants.

pub mod bus;
pub mod db;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod store;

pub use bus::{ChangeBus, ChangeEvent};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{AcademicYear, ExamType, TypeId, YearId};
pub use model::exam::{Exam, ExamId, ExamMeta};
pub use model::result::{ResultSet, ResultStatus, StudentResult};
pub use model::school::{School, SchoolId, DEFAULT_SCHOOL_ID};
pub use search::public_results::{PublicResults, PublishedExam};
pub use service::exam_catalog::{ExamCatalog, ExamError, ExamResult};
pub use service::reference_catalog::{
    AcademicYearCatalog, CatalogError, CatalogPatch, CatalogResult, ExamTypeCatalog,
    ReferenceCatalog,
};
pub use service::result_store::{ResultError, ResultStore, ResultStoreResult};
pub use service::school_registry::{
    MigrationSummary, RegistryError, RegistryResult, SchoolRegistry,
};
pub use store::{
    KvBackend, MemoryKvBackend, NamespacedStore, SqliteKvBackend, StoreError, StoreResult,
    TypedKey,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
