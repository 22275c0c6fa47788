//! Publish-filtered result lookup.
//!
//! # Responsibility
//! - List published exams with resolved display names.
//! - Answer roll-number lookups within one exam's published set.
//!
//! # Invariants
//! - Only result sets with `published == true` are ever traversed.
//! - Roll matching is exact after trimming and case folding; a supplied
//!   secondary key must match exactly.
//! - Listing order is most-recent sync first, then exam id for
//!   determinism.

use crate::model::exam::ExamId;
use crate::model::result::StudentResult;
use crate::store::keys::{self, RESULTS_KEY_PREFIX};
use crate::store::{NamespacedStore, StoreResult};
use std::rc::Rc;

/// One published exam as shown in the public selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedExam {
    pub exam_id: ExamId,
    pub display_name: String,
    /// Last admin sync time in epoch milliseconds.
    pub synced_at: i64,
}

/// Read-only, publish-filtered query surface.
pub struct PublicResults {
    store: Rc<NamespacedStore>,
}

impl PublicResults {
    pub fn new(store: Rc<NamespacedStore>) -> Self {
        Self { store }
    }

    /// Published exams of the active school, most recently synced first.
    ///
    /// Display names resolve through the exam selector metadata, then the
    /// first record's embedded exam label, then the raw exam id.
    pub fn list_published_exams(&self) -> StoreResult<Vec<PublishedExam>> {
        let metas = self.store.get(&keys::EXAM_META, Vec::new())?;

        let mut published = Vec::new();
        for logical_key in self.store.keys_in_namespace(RESULTS_KEY_PREFIX)? {
            let Some(raw_id) = logical_key.strip_prefix(RESULTS_KEY_PREFIX) else {
                continue;
            };
            let exam_id = ExamId::new(raw_id);

            let Some(set) = self.store.get_opt(&keys::results(&exam_id))? else {
                continue;
            };
            if !set.published {
                continue;
            }

            let display_name = metas
                .iter()
                .find(|m| m.exam_id == exam_id)
                .map(|m| m.display_label.clone())
                .or_else(|| set.data.first().and_then(|r| r.exam_label.clone()))
                .unwrap_or_else(|| exam_id.as_str().to_string());

            published.push(PublishedExam {
                exam_id,
                display_name,
                synced_at: set.synced_at,
            });
        }

        published.sort_by(|a, b| {
            b.synced_at
                .cmp(&a.synced_at)
                .then_with(|| a.exam_id.cmp(&b.exam_id))
        });
        Ok(published)
    }

    /// Records of one exam; `None` unless its set is published.
    pub fn get_published_results(
        &self,
        exam_id: &ExamId,
    ) -> StoreResult<Option<Vec<StudentResult>>> {
        let Some(set) = self.store.get_opt(&keys::results(exam_id))? else {
            return Ok(None);
        };
        if !set.published {
            return Ok(None);
        }
        Ok(Some(set.data))
    }

    /// Looks up one student record by roll number within one exam.
    ///
    /// The roll is matched exactly after trimming and case folding; a
    /// supplied `secondary` key (date of birth) must also match exactly.
    /// `None` when any supplied constraint misses or the set is not
    /// published.
    pub fn search(
        &self,
        roll: &str,
        exam_id: &ExamId,
        secondary: Option<&str>,
    ) -> StoreResult<Option<StudentResult>> {
        let needle = roll.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let Some(records) = self.get_published_results(exam_id)? else {
            return Ok(None);
        };

        Ok(records.into_iter().find(|record| {
            record.roll_no.trim().to_lowercase() == needle
                && secondary.map_or(true, |key| record.dob.as_deref() == Some(key))
        }))
    }
}
