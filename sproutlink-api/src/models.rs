//! Domain types shared across the db, services, and api layers
//!
//! Records cross the store boundary as typed structs rather than loose
//! JSON maps; the JSON columns in SQLite round-trip through serde here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured learning report produced for one journal submission.
///
/// Immutable once produced; stored both in the per-student history and
/// snapshotted into donor notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Per-category integer scores (1-5), keyed by category name
    pub scores: BTreeMap<String, i64>,
    /// Mean of the category scores, one decimal
    pub overall_score: f64,
    /// Narrative comparing this journal to the previous report
    pub progress_update: String,
    /// Donor-facing summary of the submission
    pub summary: String,
}

/// Per-student journal and report history.
///
/// `journal_list` and `report_list` are parallel: entry N of each came
/// from the same submission. `latest_report` always equals the last
/// entry of `report_list` after a successful update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub location: Option<String>,
    pub journal_list: Vec<String>,
    pub report_list: Vec<Report>,
    pub latest_report: Option<Report>,
    /// Optimistic-concurrency counter, bumped on every append
    pub version: i64,
}

impl StudentRecord {
    /// Empty history for a student seen for the first time
    pub fn empty(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            name: None,
            age: None,
            location: None,
            journal_list: Vec::new(),
            report_list: Vec::new(),
            latest_report: None,
            version: 0,
        }
    }
}

/// Donor-facing record of a new report event. Append-only; the only
/// mutation is the bulk mark-read for a donor+student pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub donor_id: String,
    pub student_id: String,
    pub learning_report: Option<Report>,
    pub journal_image: Option<String>,
    pub created_at: String,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> Report {
        let mut scores = BTreeMap::new();
        scores.insert("Spelling and Punctuation".to_string(), 4);
        scores.insert("Sentence Variety".to_string(), 3);
        Report {
            scores,
            overall_score: 3.5,
            progress_update: "Improved spelling".to_string(),
            summary: "A good entry".to_string(),
        }
    }

    #[test]
    fn test_report_serde_round_trip() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_empty_record_invariants() {
        let record = StudentRecord::empty("s1");
        assert_eq!(record.journal_list.len(), record.report_list.len());
        assert!(record.latest_report.is_none());
        assert_eq!(record.version, 0);
    }
}
