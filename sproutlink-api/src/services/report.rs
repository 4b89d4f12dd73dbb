//! Learning-report orchestration
//!
//! One submission = fetch history → score against the latest report →
//! append journal+report to the student record. Linking and donor
//! notification happen afterwards as a separate step; a notification
//! failure never unwinds a saved report.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db;
use crate::models::Report;
use crate::services::generator::ReportGenerator;

/// Composes the report generator with the student record store
#[derive(Clone)]
pub struct LearningReportService {
    generator: Arc<dyn ReportGenerator>,
}

impl LearningReportService {
    pub fn new(generator: Arc<dyn ReportGenerator>) -> Self {
        Self { generator }
    }

    /// Run the submission pipeline for one journal entry.
    ///
    /// A student with no prior record is scored against an empty
    /// history. Returns the newly generated report; the student record
    /// has already been updated when this returns.
    pub async fn submit(
        &self,
        pool: &SqlitePool,
        student_id: &str,
        journal: &str,
        topic: &str,
    ) -> Result<Report> {
        let existing = db::students::get_student(pool, student_id).await?;
        let previous = existing.as_ref().and_then(|r| r.latest_report.as_ref());

        let report = self.generator.generate(journal, previous, topic).await?;

        let record = db::students::append_submission(pool, student_id, journal, &report).await?;

        tracing::info!(
            student_id = student_id,
            submissions = record.journal_list.len(),
            overall_score = report.overall_score,
            "Journal submission recorded"
        );

        Ok(report)
    }
}
