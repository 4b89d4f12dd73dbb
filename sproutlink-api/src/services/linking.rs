//! Student-donor linking and donor notification
//!
//! Every student gets exactly one donor, picked uniformly at random on
//! first contact and stable afterwards. After a report is saved the
//! linked donor receives an unread notification.

use anyhow::Result;
use rand::seq::SliceRandom;
use sqlx::SqlitePool;
use sproutlink_common::Error;

use crate::db;
use crate::models::Report;

/// Linking and notification orchestrator
#[derive(Clone, Default)]
pub struct LinkingService;

impl LinkingService {
    pub fn new() -> Self {
        Self
    }

    /// Return the student's donor, assigning one at random if the
    /// student has none yet. Idempotent: repeated calls return the same
    /// donor and never create a second link.
    pub async fn ensure_link(&self, pool: &SqlitePool, student_id: &str) -> Result<String> {
        if let Some(donor_id) = db::links::get_linked_donor_id(pool, student_id).await? {
            return Ok(donor_id);
        }

        let donor_ids = db::donors::list_donor_ids(pool).await?;
        let candidate = donor_ids
            .choose(&mut rand::thread_rng())
            .ok_or(Error::DonorPoolEmpty)?;

        // Conditional insert; a concurrent first-time call may win, in
        // which case its donor comes back instead of ours.
        let winner = db::links::ensure_link(pool, student_id, candidate).await?;

        tracing::info!(
            student_id = student_id,
            donor_id = %winner,
            "Student-donor link ensured"
        );

        Ok(winner)
    }

    /// Append a notification for the student's donor about a new report.
    ///
    /// Fails if the student has no resolvable donor link.
    pub async fn notify_donor_of_new_report(
        &self,
        pool: &SqlitePool,
        student_id: &str,
        report: &Report,
        journal_image: Option<&str>,
    ) -> Result<()> {
        let donor_id = db::links::get_linked_donor_id(pool, student_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("No donor linked to student {}", student_id))
            })?;

        db::notifications::insert_notification(pool, &donor_id, student_id, report, journal_image)
            .await?;

        tracing::info!(
            student_id = student_id,
            donor_id = %donor_id,
            "Donor notified of new report"
        );

        Ok(())
    }
}
