pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod runner;
pub mod scheduler;

pub use config::AppConfig;
pub use database::{PracticeStore, SqliteStore};
pub use error::{Error, Result, SettingsError};
pub use models::{PracticeSession, Question, RewardLedger, SessionEvent, SessionPhase, Settings};
pub use runner::SessionRunner;
