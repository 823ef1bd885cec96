//! Database operations for the practice app
//!
//! Handles SQLite database initialization and the tables for wrong answers,
//! session history and the reward ledger.

use super::store::PracticeStore;
use crate::error::{Error, Result};
use crate::models::{RewardLedger, SessionRecord, Statistics, WrongAnswerRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// The ledger is a single row with a fixed key.
const REWARDS_ROW_ID: i64 = 1;

/// Opens (or creates) the database file and makes sure all tables exist
pub fn init_database(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path.as_ref())?;
    create_tables(&conn)?;
    info!(path = %path.as_ref().display(), "database ready");
    Ok(conn)
}

/// In-memory database with the full schema, used by tests and as a fallback
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    // Wrong answers are unique per question text and answer
    conn.execute(
        "CREATE TABLE IF NOT EXISTS wrong_answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_text TEXT NOT NULL,
            correct_answer INTEGER NOT NULL,
            date_added TEXT NOT NULL,
            UNIQUE(question_text, correct_answer)
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            total_questions INTEGER NOT NULL,
            correct_answers INTEGER NOT NULL
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS rewards (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            unicorns INTEGER NOT NULL DEFAULT 0,
            bananas INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

// Fixed-width UTC timestamps so that ORDER BY on the text column is chronological
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::Timestamp(raw.to_string()))
}

/// Retrieves all wrong answers, oldest first
pub fn get_wrong_answers(conn: &Connection) -> Result<Vec<WrongAnswerRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, question_text, correct_answer, date_added
         FROM wrong_answers
         ORDER BY date_added ASC, id ASC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, question_text, correct_answer, date_added)| {
            Ok(WrongAnswerRecord {
                id,
                question_text,
                correct_answer,
                date_added: parse_timestamp(&date_added)?,
            })
        })
        .collect()
}

pub fn count_wrong_answers(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM wrong_answers", [], |row| row.get(0))?;
    Ok(count as usize)
}

pub fn find_wrong_answer(
    question_text: &str,
    correct_answer: i64,
    conn: &Connection,
) -> Result<Option<WrongAnswerRecord>> {
    let row = conn
        .query_row(
            "SELECT id, date_added FROM wrong_answers
             WHERE question_text = ?1 AND correct_answer = ?2",
            params![question_text, correct_answer],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    row.map(|(id, date_added)| {
        Ok(WrongAnswerRecord {
            id,
            question_text: question_text.to_string(),
            correct_answer,
            date_added: parse_timestamp(&date_added)?,
        })
    })
    .transpose()
}

/// Adds a wrong answer. Duplicates are ignored due to the UNIQUE constraint.
///
/// Returns true if a new row was written.
pub fn add_wrong_answer(
    question_text: &str,
    correct_answer: i64,
    date_added: DateTime<Utc>,
    conn: &Connection,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO wrong_answers (question_text, correct_answer, date_added)
         VALUES (?1, ?2, ?3)",
        params![question_text, correct_answer, format_timestamp(date_added)],
    )?;
    debug!(question_text, correct_answer, inserted, "stored wrong answer");
    Ok(inserted > 0)
}

pub fn delete_wrong_answer(id: i64, conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM wrong_answers WHERE id = ?1", params![id])?;
    debug!(id, "deleted wrong answer");
    Ok(())
}

/// Reads the reward ledger if it has been created
pub fn get_rewards(conn: &Connection) -> Result<Option<RewardLedger>> {
    let row = conn
        .query_row(
            "SELECT unicorns, bananas, last_updated FROM rewards WHERE id = ?1",
            params![REWARDS_ROW_ID],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(unicorns, bananas, last_updated)| {
        Ok(RewardLedger {
            unicorns,
            bananas,
            last_updated: parse_timestamp(&last_updated)?,
        })
    })
    .transpose()
}

pub fn update_rewards(ledger: &RewardLedger, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO rewards (id, unicorns, bananas, last_updated) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            unicorns = excluded.unicorns,
            bananas = excluded.bananas,
            last_updated = excluded.last_updated",
        params![
            REWARDS_ROW_ID,
            ledger.unicorns,
            ledger.bananas,
            format_timestamp(ledger.last_updated)
        ],
    )?;
    Ok(())
}

/// Creates the reward ledger on first run and returns the stored one
pub fn ensure_rewards(conn: &Connection) -> Result<RewardLedger> {
    let created = conn.execute(
        "INSERT OR IGNORE INTO rewards (id, unicorns, bananas, last_updated)
         VALUES (?1, 0, 0, ?2)",
        params![REWARDS_ROW_ID, format_timestamp(Utc::now())],
    )?;
    if created > 0 {
        info!("created reward ledger");
    }

    match get_rewards(conn)? {
        Some(ledger) => Ok(ledger),
        None => Err(rusqlite::Error::QueryReturnedNoRows.into()),
    }
}

pub fn add_session_record(
    date: DateTime<Utc>,
    total_questions: u32,
    correct_answers: u32,
    conn: &Connection,
) -> Result<SessionRecord> {
    conn.execute(
        "INSERT INTO session_records (date, total_questions, correct_answers)
         VALUES (?1, ?2, ?3)",
        params![format_timestamp(date), total_questions, correct_answers],
    )?;

    Ok(SessionRecord {
        id: conn.last_insert_rowid(),
        date,
        total_questions,
        correct_answers,
    })
}

/// Retrieves session history, newest first
pub fn get_session_records(conn: &Connection) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, total_questions, correct_answers
         FROM session_records
         ORDER BY date DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, date, total_questions, correct_answers)| {
            Ok(SessionRecord {
                id,
                date: parse_timestamp(&date)?,
                total_questions,
                correct_answers,
            })
        })
        .collect()
}

/// Sums over the whole history
pub fn get_statistics(conn: &Connection) -> Result<Statistics> {
    let stats = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(total_questions), 0), COALESCE(SUM(correct_answers), 0)
         FROM session_records",
        [],
        |row| {
            Ok(Statistics {
                sessions: row.get(0)?,
                total_questions: row.get(1)?,
                total_correct: row.get(2)?,
            })
        },
    )?;
    Ok(stats)
}

pub fn clear_history(conn: &Connection) -> Result<()> {
    let removed = conn.execute("DELETE FROM session_records", ())?;
    info!(removed, "cleared session history");
    Ok(())
}

/// Shared handle to the practice database.
///
/// Cloning is cheap; every clone talks to the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(init_database(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(open_in_memory()?))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-written row behind,
        // SQLite statements are atomic.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear_history(&self) -> Result<()> {
        clear_history(&self.conn())
    }
}

impl PracticeStore for SqliteStore {
    fn wrong_answers(&self) -> Result<Vec<WrongAnswerRecord>> {
        get_wrong_answers(&self.conn())
    }

    fn wrong_answer_count(&self) -> Result<usize> {
        count_wrong_answers(&self.conn())
    }

    fn find_wrong_answer(
        &self,
        question_text: &str,
        correct_answer: i64,
    ) -> Result<Option<WrongAnswerRecord>> {
        find_wrong_answer(question_text, correct_answer, &self.conn())
    }

    fn insert_wrong_answer(
        &self,
        question_text: &str,
        correct_answer: i64,
        date_added: DateTime<Utc>,
    ) -> Result<bool> {
        add_wrong_answer(question_text, correct_answer, date_added, &self.conn())
    }

    fn delete_wrong_answer(&self, id: i64) -> Result<()> {
        delete_wrong_answer(id, &self.conn())
    }

    fn load_rewards(&self) -> Result<Option<RewardLedger>> {
        get_rewards(&self.conn())
    }

    fn save_rewards(&self, ledger: &RewardLedger) -> Result<()> {
        update_rewards(ledger, &self.conn())
    }

    fn ensure_rewards(&self) -> Result<RewardLedger> {
        ensure_rewards(&self.conn())
    }

    fn insert_session_record(
        &self,
        date: DateTime<Utc>,
        total_questions: u32,
        correct_answers: u32,
    ) -> Result<SessionRecord> {
        add_session_record(date, total_questions, correct_answers, &self.conn())
    }

    fn session_records(&self) -> Result<Vec<SessionRecord>> {
        get_session_records(&self.conn())
    }

    fn statistics(&self) -> Result<Statistics> {
        get_statistics(&self.conn())
    }
}
