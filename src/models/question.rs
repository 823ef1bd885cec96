//! A single arithmetic exercise: the text shown to the learner and the expected answer.
use serde::{Deserialize, Serialize};

/// Appended to every rendered question.
pub const QUESTION_SUFFIX: &str = " = ?";

/// Text of the question produced when no operator is enabled.
pub const NO_OPERATIONS_TEXT: &str = "no operations available";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub answer: i64,
}

impl Question {
    /// Builds a question from operand text without the `" = ?"` suffix.
    pub fn from_bare(bare_text: &str, answer: i64) -> Self {
        Self {
            text: format!("{bare_text}{QUESTION_SUFFIX}"),
            answer,
        }
    }

    /// Question text with the `" = ?"` suffix removed, as stored in the wrong-answer pool.
    pub fn bare_text(&self) -> &str {
        self.text
            .strip_suffix(QUESTION_SUFFIX)
            .unwrap_or(&self.text)
    }

    /// Text used in the session summary, e.g. `"7 + 5 = 12"`.
    pub fn solved_text(&self) -> String {
        format!("{} = {}", self.bare_text(), self.answer)
    }

    pub fn is_sentinel(&self) -> bool {
        self.text == NO_OPERATIONS_TEXT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "x",
            Operator::Div => "÷",
        }
    }
}
