//! In-memory report store.
//!
//! Reports are immutable once stored. An edit builds a new report from a
//! snapshot and swaps it in only if no other writer got there first, so a
//! reader always sees one consistent report.

use std::sync::Arc;

use dashmap::DashMap;
use encore_grade::{GradeError, PerformanceReport, ScoreEdit};
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Grade(#[from] GradeError),
}

#[derive(Clone, Default)]
pub struct ReportStore {
    reports: Arc<DashMap<Uuid, Arc<PerformanceReport>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip_all, fields(report.id))]
    pub fn insert(&self, report: PerformanceReport) -> (Uuid, Arc<PerformanceReport>) {
        let id = Uuid::new_v4();
        tracing::Span::current().record("report.id", tracing::field::display(id));

        let report = Arc::new(report);
        self.reports.insert(id, Arc::clone(&report));
        info!(overall = %report.overall_grade(), "Stored report");
        (id, report)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<PerformanceReport>> {
        self.reports.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Apply score edits atomically. On error the stored report is untouched.
    #[instrument(skip(self, edits), fields(report.id = %id, edits = edits.len()))]
    pub fn apply_edits(
        &self,
        id: &Uuid,
        edits: &[ScoreEdit],
    ) -> Result<Arc<PerformanceReport>, StoreError> {
        loop {
            let snapshot = self.get(id).ok_or(StoreError::NotFound(*id))?;
            let updated = Arc::new(snapshot.apply_edits(edits)?);

            match self.reports.get_mut(id) {
                Some(mut entry) if Arc::ptr_eq(entry.value(), &snapshot) => {
                    *entry.value_mut() = Arc::clone(&updated);
                    info!(overall = %updated.overall_grade(), "Report regraded");
                    return Ok(updated);
                }
                Some(_) => {
                    debug!("Report changed during edit, retrying");
                }
                None => return Err(StoreError::NotFound(*id)),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
