//! The persistence contract the practice engine relies on.
//!
//! All calls are synchronous and are made from the single thread that drives the session,
//! so the engine never observes a half-finished write.

use crate::error::Result;
use crate::models::{RewardLedger, SessionRecord, Statistics, WrongAnswerRecord};
use chrono::{DateTime, Utc};

pub trait PracticeStore {
    /// Every stored wrong answer, oldest first.
    fn wrong_answers(&self) -> Result<Vec<WrongAnswerRecord>>;

    fn wrong_answer_count(&self) -> Result<usize>;

    /// Looks up the record with exactly this bare question text and answer.
    fn find_wrong_answer(
        &self,
        question_text: &str,
        correct_answer: i64,
    ) -> Result<Option<WrongAnswerRecord>>;

    /// Stores a wrong answer unless an identical `(question_text, correct_answer)` pair
    /// already exists. Returns whether a new row was written.
    fn insert_wrong_answer(
        &self,
        question_text: &str,
        correct_answer: i64,
        date_added: DateTime<Utc>,
    ) -> Result<bool>;

    fn delete_wrong_answer(&self, id: i64) -> Result<()>;

    /// Reads the reward ledger fresh from storage. `None` until [`ensure_rewards`] ran.
    ///
    /// [`ensure_rewards`]: PracticeStore::ensure_rewards
    fn load_rewards(&self) -> Result<Option<RewardLedger>>;

    fn save_rewards(&self, ledger: &RewardLedger) -> Result<()>;

    /// Creates the ledger if it does not exist yet and returns the stored state.
    fn ensure_rewards(&self) -> Result<RewardLedger>;

    fn insert_session_record(
        &self,
        date: DateTime<Utc>,
        total_questions: u32,
        correct_answers: u32,
    ) -> Result<SessionRecord>;

    /// Session history, newest first.
    fn session_records(&self) -> Result<Vec<SessionRecord>>;

    fn statistics(&self) -> Result<Statistics>;
}
