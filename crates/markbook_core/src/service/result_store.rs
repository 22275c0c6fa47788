//! Admin-facing result set management.
//!
//! # Responsibility
//! - Replace per-exam result data and track sync time.
//! - Toggle the publish flag gating public visibility.
//!
//! # Invariants
//! - Publishing and unpublishing never mutate the `data` array.
//! - Result sets are addressable by exam id even after the exam profile
//!   is deleted.

use crate::model::exam::ExamId;
use crate::model::now_epoch_ms;
use crate::model::result::{ResultSet, StudentResult};
use crate::store::keys::{self, RESULTS_KEY_PREFIX};
use crate::store::{NamespacedStore, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type ResultStoreResult<T> = Result<T, ResultError>;

/// Errors of the admin result surface.
#[derive(Debug)]
pub enum ResultError {
    /// Publish toggles require an existing result set.
    NoResultSet(ExamId),
    Store(StoreError),
}

impl Display for ResultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoResultSet(id) => {
                write!(f, "no result set exists for exam {id}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NoResultSet(_) => None,
        }
    }
}

impl From<StoreError> for ResultError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Admin surface over per-exam result sets of the active school.
pub struct ResultStore {
    store: Rc<NamespacedStore>,
}

impl ResultStore {
    pub fn new(store: Rc<NamespacedStore>) -> Self {
        Self { store }
    }

    /// Replaces the result data of one exam and refreshes its sync time.
    ///
    /// The publish flag of an existing set is preserved; a new set starts
    /// unpublished.
    pub fn set_result_set(
        &self,
        exam_id: &ExamId,
        data: Vec<StudentResult>,
    ) -> ResultStoreResult<ResultSet> {
        let key = keys::results(exam_id);
        let mut set = self.store.get(&key, ResultSet::default())?;
        set.synced_at = now_epoch_ms();
        set.data = data;
        self.store.set(&key, &set)?;

        info!(
            "event=results_sync module=results status=ok exam_id={exam_id} rows={} published={}",
            set.data.len(),
            set.published
        );
        Ok(set)
    }

    /// Makes the exam's result set visible to the public surface.
    pub fn publish(&self, exam_id: &ExamId) -> ResultStoreResult<()> {
        self.set_published(exam_id, true)
    }

    /// Hides the exam's result set from the public surface.
    pub fn unpublish(&self, exam_id: &ExamId) -> ResultStoreResult<()> {
        self.set_published(exam_id, false)
    }

    /// Unfiltered admin read of one result set.
    pub fn result_set(&self, exam_id: &ExamId) -> ResultStoreResult<Option<ResultSet>> {
        Ok(self.store.get_opt(&keys::results(exam_id))?)
    }

    /// Ids of every exam with a stored result set in this namespace,
    /// including orphaned sets whose exam profile was deleted.
    pub fn exam_ids(&self) -> ResultStoreResult<Vec<ExamId>> {
        let stored = self.store.keys_in_namespace(RESULTS_KEY_PREFIX)?;
        Ok(stored
            .iter()
            .filter_map(|k| k.strip_prefix(RESULTS_KEY_PREFIX))
            .map(ExamId::new)
            .collect())
    }

    fn set_published(&self, exam_id: &ExamId, published: bool) -> ResultStoreResult<()> {
        let key = keys::results(exam_id);
        let mut set = self
            .store
            .get_opt(&key)?
            .ok_or_else(|| ResultError::NoResultSet(exam_id.clone()))?;

        set.published = published;
        self.store.set(&key, &set)?;

        info!(
            "event=results_publish module=results status=ok exam_id={exam_id} published={published}"
        );
        Ok(())
    }
}
