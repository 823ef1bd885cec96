//! JSON export of a learner's progress.
//! Bundles rewards, statistics, session history and open wrong answers into one file.

use crate::database::PracticeStore;
use crate::error::Result;
use crate::models::{RewardLedger, SessionRecord, Statistics, WrongAnswerRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PracticeReport {
    pub exported_at: DateTime<Utc>,
    pub rewards: Option<RewardLedger>,
    pub statistics: Statistics,
    pub sessions: Vec<SessionRecord>,
    pub wrong_answers: Vec<WrongAnswerRecord>,
}

impl PracticeReport {
    pub fn collect(store: &impl PracticeStore) -> Result<Self> {
        Ok(Self {
            exported_at: Utc::now(),
            rewards: store.load_rewards()?,
            statistics: store.statistics()?,
            sessions: store.session_records()?,
            wrong_answers: store.wrong_answers()?,
        })
    }
}

/// Writes the report as pretty-printed JSON to the specified path.
pub fn export_report_to_path(report: &PracticeReport, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(report)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!(
        path = %path.display(),
        sessions = report.sessions.len(),
        "report exported"
    );
    Ok(())
}

/// Reads a report written by [`export_report_to_path`].
pub fn import_report(path: &Path) -> Result<PracticeReport> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let report: PracticeReport = serde_json::from_str(&contents)?;
    Ok(report)
}
