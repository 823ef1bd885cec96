//! SQLite-backed store whose writes can be switched to fail, for exercising error paths.

use super::{PracticeStore, SqliteStore};
use crate::error::{Error, Result};
use crate::models::{RewardLedger, SessionRecord, Statistics, WrongAnswerRecord};
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::io;
use std::rc::Rc;

#[derive(Clone)]
pub(crate) struct FailingStore {
    inner: SqliteStore,
    fail_wrong_answer_inserts: Rc<Cell<bool>>,
    fail_session_records: Rc<Cell<bool>>,
}

impl FailingStore {
    pub(crate) fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            fail_wrong_answer_inserts: Rc::new(Cell::new(false)),
            fail_session_records: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn fail_wrong_answer_inserts(&self, fail: bool) {
        self.fail_wrong_answer_inserts.set(fail);
    }

    pub(crate) fn fail_session_records(&self, fail: bool) {
        self.fail_session_records.set(fail);
    }
}

fn unavailable() -> Error {
    Error::Io(io::Error::other("store unavailable"))
}

impl PracticeStore for FailingStore {
    fn wrong_answers(&self) -> Result<Vec<WrongAnswerRecord>> {
        self.inner.wrong_answers()
    }

    fn wrong_answer_count(&self) -> Result<usize> {
        self.inner.wrong_answer_count()
    }

    fn find_wrong_answer(
        &self,
        question_text: &str,
        correct_answer: i64,
    ) -> Result<Option<WrongAnswerRecord>> {
        self.inner.find_wrong_answer(question_text, correct_answer)
    }

    fn insert_wrong_answer(
        &self,
        question_text: &str,
        correct_answer: i64,
        date_added: DateTime<Utc>,
    ) -> Result<bool> {
        if self.fail_wrong_answer_inserts.get() {
            return Err(unavailable());
        }
        self.inner
            .insert_wrong_answer(question_text, correct_answer, date_added)
    }

    fn delete_wrong_answer(&self, id: i64) -> Result<()> {
        self.inner.delete_wrong_answer(id)
    }

    fn load_rewards(&self) -> Result<Option<RewardLedger>> {
        self.inner.load_rewards()
    }

    fn save_rewards(&self, ledger: &RewardLedger) -> Result<()> {
        self.inner.save_rewards(ledger)
    }

    fn ensure_rewards(&self) -> Result<RewardLedger> {
        self.inner.ensure_rewards()
    }

    fn insert_session_record(
        &self,
        date: DateTime<Utc>,
        total_questions: u32,
        correct_answers: u32,
    ) -> Result<SessionRecord> {
        if self.fail_session_records.get() {
            return Err(unavailable());
        }
        self.inner
            .insert_session_record(date, total_questions, correct_answers)
    }

    fn session_records(&self) -> Result<Vec<SessionRecord>> {
        self.inner.session_records()
    }

    fn statistics(&self) -> Result<Statistics> {
        self.inner.statistics()
    }
}
