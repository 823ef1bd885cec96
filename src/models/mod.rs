pub mod generator;
pub mod practice_session;
pub mod question;
pub mod rewards;
pub mod session_record;
pub mod settings;
pub mod wrong_answer;

pub use generator::QuestionSource;
pub use practice_session::{PracticeSession, SessionEvent, SessionPhase, SessionTimer};
pub use question::{NO_OPERATIONS_TEXT, Operator, QUESTION_SUFFIX, Question};
pub use rewards::{Payout, RewardCounters, RewardLedger};
pub use session_record::{ScoreBand, SessionRecord, SessionSummary, Statistics};
pub use settings::Settings;
pub use wrong_answer::WrongAnswerRecord;
