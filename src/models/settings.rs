//! Shape of a requested practice session. Built once by the settings form and never mutated
//! while a session runs.
use super::Operator;
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};

pub const MAX_QUESTION_COUNT: u32 = 100;
pub const MAX_TIME_LIMIT_MINUTES: u32 = 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub use_addition: bool,
    pub use_subtraction: bool,
    pub use_multiplication: bool,
    pub use_division: bool,
    pub question_count: u32,
    pub use_timer: bool,
    pub time_limit_minutes: u32,
    pub use_three_operands: bool,
    pub include_wrong_answers: bool,
    pub wrong_answers_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_addition: true,
            use_subtraction: false,
            use_multiplication: false,
            use_division: false,
            question_count: 15,
            use_timer: false,
            time_limit_minutes: 5,
            use_three_operands: false,
            include_wrong_answers: false,
            wrong_answers_only: false,
        }
    }
}

impl Settings {
    /// Preset for practicing only stored wrong answers: operators off, one question per
    /// stored record.
    pub fn wrong_answers_only(pool_size: usize) -> Self {
        Self {
            use_addition: false,
            use_subtraction: false,
            use_multiplication: false,
            use_division: false,
            question_count: (pool_size as u32).max(1),
            wrong_answers_only: true,
            ..Self::default()
        }
    }

    /// Enabled operators in a fixed order.
    pub fn operators(&self) -> Vec<Operator> {
        let flags = [
            self.use_addition,
            self.use_subtraction,
            self.use_multiplication,
            self.use_division,
        ];
        Operator::ALL
            .into_iter()
            .zip(flags)
            .filter_map(|(op, enabled)| enabled.then_some(op))
            .collect()
    }

    pub fn set_operator(&mut self, op: Operator, enabled: bool) {
        match op {
            Operator::Add => self.use_addition = enabled,
            Operator::Sub => self.use_subtraction = enabled,
            Operator::Mul => self.use_multiplication = enabled,
            Operator::Div => self.use_division = enabled,
        }
    }

    pub fn time_limit_secs(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }

    /// Checks the preconditions the engine relies on. The engine does not call this itself;
    /// it is the gate the settings form applies before starting a session.
    pub fn validate(&self, available_wrong_answers: usize) -> Result<(), SettingsError> {
        let max = if self.wrong_answers_only {
            if available_wrong_answers == 0 {
                return Err(SettingsError::EmptyWrongAnswerPool);
            }
            (available_wrong_answers as u32).min(MAX_QUESTION_COUNT)
        } else {
            if self.operators().is_empty() {
                return Err(SettingsError::NoOperators);
            }
            MAX_QUESTION_COUNT
        };

        if self.question_count == 0 || self.question_count > max {
            return Err(SettingsError::QuestionCountOutOfRange {
                count: self.question_count,
                max,
            });
        }

        if self.use_timer
            && !(1..=MAX_TIME_LIMIT_MINUTES).contains(&self.time_limit_minutes)
        {
            return Err(SettingsError::TimeLimitOutOfRange(self.time_limit_minutes));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(Settings::default().validate(0), Ok(()));
        assert_eq!(Settings::default().operators(), vec![Operator::Add]);
    }

    #[test]
    fn test_no_operators_rejected() {
        let mut settings = Settings::default();
        settings.set_operator(Operator::Add, false);
        assert_eq!(settings.validate(3), Err(SettingsError::NoOperators));
    }

    #[test]
    fn test_wrong_answers_only_ignores_operators() {
        let settings = Settings::wrong_answers_only(4);
        assert!(settings.operators().is_empty());
        assert_eq!(settings.question_count, 4);
        assert_eq!(settings.validate(4), Ok(()));
        assert_eq!(
            settings.validate(0),
            Err(SettingsError::EmptyWrongAnswerPool)
        );
        assert_eq!(
            settings.validate(2),
            Err(SettingsError::QuestionCountOutOfRange { count: 4, max: 2 })
        );
    }

    #[test]
    fn test_timer_limits() {
        let settings = Settings {
            use_timer: true,
            time_limit_minutes: 0,
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(0),
            Err(SettingsError::TimeLimitOutOfRange(0))
        );

        let settings = Settings {
            use_timer: true,
            time_limit_minutes: 3,
            ..Settings::default()
        };
        assert_eq!(settings.time_limit_secs(), 180);
        assert_eq!(settings.validate(0), Ok(()));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings: Settings = toml::from_str("question_count = 5\nuse_division = true").unwrap();
        assert_eq!(settings.question_count, 5);
        assert_eq!(settings.operators(), vec![Operator::Add, Operator::Div]);
    }
}
