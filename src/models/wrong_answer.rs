//! A previously missed question kept for later re-practice.
use super::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongAnswerRecord {
    pub id: i64,
    /// Operands and operator only, without the `" = ?"` suffix.
    pub question_text: String,
    pub correct_answer: i64,
    pub date_added: DateTime<Utc>,
}

impl WrongAnswerRecord {
    /// Renders the record back into a question for the learner.
    pub fn to_question(&self) -> Question {
        Question::from_bare(&self.question_text, self.correct_answer)
    }
}
