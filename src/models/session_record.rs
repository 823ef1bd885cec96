//! Session outcomes: the persisted history row, the end-of-session summary, and the
//! long-term statistics aggregated over all history rows.
use super::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn percentage(correct: u32, total: u32) -> f64 {
    if total > 0 {
        f64::from(correct) / f64::from(total) * 100.0
    } else {
        0.0
    }
}

/// Coarse rating of a score, used to colour results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_percentage(score: f64) -> Self {
        if score > 75.0 {
            ScoreBand::Good
        } else if score > 40.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

/// One finished session. Written exactly once, never updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub total_questions: u32,
    pub correct_answers: u32,
}

impl SessionRecord {
    pub fn wrong_answers(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_answers)
    }

    pub fn score_percentage(&self) -> f64 {
        percentage(self.correct_answers, self.total_questions)
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_percentage(self.score_percentage())
    }
}

/// Payload of the "session finished" notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub wrongly_answered: Vec<Question>,
    pub aborted: bool,
}

impl SessionSummary {
    pub fn wrong_answers(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_answers)
    }

    pub fn score_percentage(&self) -> f64 {
        percentage(self.correct_answers, self.total_questions)
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_percentage(self.score_percentage())
    }
}

/// Totals over every stored session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub sessions: u32,
    pub total_questions: u32,
    pub total_correct: u32,
}

impl Statistics {
    pub fn total_wrong(&self) -> u32 {
        self.total_questions.saturating_sub(self.total_correct)
    }

    pub fn overall_ratio(&self) -> f64 {
        percentage(self.total_correct, self.total_questions)
    }
}
