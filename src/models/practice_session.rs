//! Practice session state machine.
//! Runs the question-by-question loop, decides when a session ends and records its outcome.

use super::generator::{self, QuestionSource};
use super::{
    Payout, Question, RewardCounters, RewardLedger, SessionSummary, Settings, WrongAnswerRecord,
};
use crate::database::PracticeStore;
use crate::error::Result;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the right/wrong feedback stays up before the next question.
pub const FEEDBACK_DELAY: Duration = Duration::from_secs(1);
/// Delay before an aborted session view is closed.
pub const CLOSE_DELAY: Duration = Duration::from_millis(500);
/// Period of the clock that drives the session timer.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    /// A question is shown and the timer (if any) runs.
    AwaitingAnswer,
    /// The answer was evaluated; the timer is suspended until [`PracticeSession::advance`].
    Feedback,
    Finished,
}

impl SessionPhase {
    pub fn in_progress(self) -> bool {
        matches!(self, SessionPhase::AwaitingAnswer | SessionPhase::Feedback)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionTimer {
    pub total: Duration,
    pub remaining: Duration,
}

impl SessionTimer {
    /// Share of the time limit still left, from 1.0 down to 0.0.
    pub fn fraction_remaining(&self) -> f32 {
        if self.total.is_zero() {
            0.0
        } else {
            self.remaining.as_secs_f32() / self.total.as_secs_f32()
        }
    }

    /// Less than a fifth of the time left.
    pub fn is_running_low(&self) -> bool {
        self.remaining * 5 < self.total
    }
}

/// Notifications for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    QuestionReady(Question),
    Feedback {
        correct: bool,
        correct_answer: i64,
        display_for: Duration,
    },
    RewardsEarned(Payout),
    Finished(SessionSummary),
    CloseRequested { after: Duration },
}

pub struct PracticeSession<S: PracticeStore> {
    settings: Settings,
    store: S,
    rng: StdRng,
    feedback_delay: Duration,
    close_delay: Duration,

    phase: SessionPhase,
    current_question: Option<Question>,
    current_source: QuestionSource,
    question_index: u32,
    correct_answers: u32,
    wrongly_answered: Vec<Question>,
    wrong_answer_queue: VecDeque<WrongAnswerRecord>,
    recycled_asked: u32,
    counters: RewardCounters,
    timer: Option<SessionTimer>,
    summary: Option<SessionSummary>,
}

impl<S: PracticeStore> PracticeSession<S> {
    pub fn new(settings: Settings, store: S) -> Self {
        Self {
            settings,
            store,
            rng: StdRng::from_entropy(),
            feedback_delay: FEEDBACK_DELAY,
            close_delay: CLOSE_DELAY,
            phase: SessionPhase::NotStarted,
            current_question: None,
            current_source: QuestionSource::Fresh,
            question_index: 0,
            correct_answers: 0,
            wrongly_answered: Vec::new(),
            wrong_answer_queue: VecDeque::new(),
            recycled_asked: 0,
            counters: RewardCounters::default(),
            timer: None,
            summary: None,
        }
    }

    /// Makes question generation and wrong-answer sampling reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_delays(mut self, feedback: Duration, close: Duration) -> Self {
        self.feedback_delay = feedback;
        self.close_delay = close;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// Whether the current question came from the wrong-answer pool.
    pub fn is_current_recycled(&self) -> bool {
        self.current_source.is_recycled()
    }

    /// 1-based number of the question currently shown.
    pub fn question_number(&self) -> u32 {
        self.question_index + 1
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn wrongly_answered(&self) -> &[Question] {
        &self.wrongly_answered
    }

    pub fn recycled_asked(&self) -> u32 {
        self.recycled_asked
    }

    pub fn pending_wrong_answers(&self) -> usize {
        self.wrong_answer_queue.len()
    }

    pub fn counters(&self) -> RewardCounters {
        self.counters
    }

    pub fn timer(&self) -> Option<SessionTimer> {
        self.timer
    }

    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    pub fn close_delay(&self) -> Duration {
        self.close_delay
    }

    /// Set once the session is finished.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Resets the per-session state, samples the wrong-answer pool, arms the timer and
    /// asks the first question.
    pub fn start(&mut self) -> Result<Vec<SessionEvent>> {
        let queue = if self.settings.wrong_answers_only || self.settings.include_wrong_answers {
            let mut records = self.store.wrong_answers()?;
            records.shuffle(&mut self.rng);
            if self.settings.wrong_answers_only {
                records.truncate(self.settings.question_count as usize);
            }
            records.into()
        } else {
            VecDeque::new()
        };

        self.wrong_answer_queue = queue;
        self.question_index = 0;
        self.correct_answers = 0;
        self.wrongly_answered.clear();
        self.recycled_asked = 0;
        self.counters = RewardCounters::default();
        self.summary = None;
        self.timer = self.settings.use_timer.then(|| {
            let total = Duration::from_secs(self.settings.time_limit_secs());
            SessionTimer {
                total,
                remaining: total,
            }
        });

        info!(
            questions = self.settings.question_count,
            sampled_wrong_answers = self.wrong_answer_queue.len(),
            timed = self.timer.is_some(),
            "practice session started"
        );

        Ok(vec![self.next_question()])
    }

    fn next_question(&mut self) -> SessionEvent {
        let (question, source) =
            generator::generate(&self.settings, &mut self.wrong_answer_queue, &mut self.rng);
        if source == QuestionSource::WrongAnswersOnly {
            self.recycled_asked += 1;
        }
        self.current_source = source;
        self.current_question = Some(question.clone());
        self.phase = SessionPhase::AwaitingAnswer;
        SessionEvent::QuestionReady(question)
    }

    /// Evaluates the learner's answer.
    ///
    /// Input that is not exactly an integer (surrounding whitespace included), or arriving
    /// while no question is pending, is ignored.
    /// The in-memory state moves to [`SessionPhase::Feedback`] before anything is
    /// persisted, so a failing store leaves the session consistent.
    pub fn submit_answer(&mut self, input: &str) -> Result<Vec<SessionEvent>> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Ok(Vec::new());
        }
        let Ok(value) = input.parse::<i64>() else {
            return Ok(Vec::new());
        };
        let Some(question) = self.current_question.clone() else {
            return Ok(Vec::new());
        };

        let correct = value == question.answer;
        if correct {
            self.correct_answers += 1;
            self.counters.since_last_unicorn += 1;
        } else {
            if !self.wrongly_answered.contains(&question) {
                self.wrongly_answered.push(question.clone());
            }
            self.counters.since_last_banana += 1;
        }
        self.phase = SessionPhase::Feedback;
        debug!(question = %question.text, value, correct, "answer submitted");

        let mut events = vec![SessionEvent::Feedback {
            correct,
            correct_answer: question.answer,
            display_for: self.feedback_delay,
        }];

        if correct {
            self.record_correct(&question)?;
        } else {
            self.record_wrong(&question)?;
        }

        if let Some(payout) = self.accrue_rewards()? {
            events.push(SessionEvent::RewardsEarned(payout));
        }

        Ok(events)
    }

    fn record_correct(&mut self, question: &Question) -> Result<()> {
        let Some(record) = self
            .store
            .find_wrong_answer(question.bare_text(), question.answer)?
        else {
            return Ok(());
        };

        self.store.delete_wrong_answer(record.id)?;
        info!(question = %record.question_text, "stored wrong answer solved");
        self.update_ledger(|ledger, _| ledger.redeem_banana(Utc::now()))?;
        Ok(())
    }

    fn record_wrong(&mut self, question: &Question) -> Result<()> {
        if question.is_sentinel() {
            warn!("not storing the no-operations placeholder as a wrong answer");
        } else if self
            .store
            .find_wrong_answer(question.bare_text(), question.answer)?
            .is_none()
        {
            self.store
                .insert_wrong_answer(question.bare_text(), question.answer, Utc::now())?;
        }

        self.update_ledger(|ledger, _| ledger.penalize_wrong_answer(Utc::now()))?;
        Ok(())
    }

    /// Runs the threshold conversion against a freshly loaded ledger.
    fn accrue_rewards(&mut self) -> Result<Option<Payout>> {
        let payout = self.update_ledger(|ledger, counters| ledger.accrue(counters, Utc::now()))?;
        Ok(payout.filter(|p| !p.is_empty()))
    }

    /// Loads the ledger, applies `f` and saves it. A missing ledger skips the update and
    /// leaves the session counters untouched.
    fn update_ledger<T>(
        &mut self,
        f: impl FnOnce(&mut RewardLedger, &mut RewardCounters) -> T,
    ) -> Result<Option<T>> {
        let Some(mut ledger) = self.store.load_rewards()? else {
            warn!("reward ledger missing, reward update skipped");
            return Ok(None);
        };

        let result = f(&mut ledger, &mut self.counters);
        self.store.save_rewards(&ledger)?;
        debug!(
            unicorns = ledger.unicorns,
            bananas = ledger.bananas,
            "reward ledger updated"
        );
        Ok(Some(result))
    }

    /// Leaves the feedback window: ends the session or asks the next question.
    pub fn advance(&mut self) -> Result<Vec<SessionEvent>> {
        if self.phase != SessionPhase::Feedback {
            return Ok(Vec::new());
        }

        let asked = self.question_number();
        let count_reached = asked >= self.settings.question_count;
        let pool_exhausted =
            self.settings.wrong_answers_only && self.recycled_asked >= self.settings.question_count;

        if count_reached || pool_exhausted {
            return self.end_session(false);
        }

        self.question_index += 1;
        Ok(vec![self.next_question()])
    }

    /// Counts down the session timer. Only runs while a question is waiting for an answer.
    pub fn tick(&mut self, elapsed: Duration) -> Result<Vec<SessionEvent>> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Ok(Vec::new());
        }
        let Some(timer) = self.timer.as_mut() else {
            return Ok(Vec::new());
        };

        timer.remaining = timer.remaining.saturating_sub(elapsed);
        if timer.remaining.is_zero() {
            info!("time limit reached");
            return self.end_session(false);
        }
        Ok(Vec::new())
    }

    /// Ends a running session at the learner's request. Bookkeeping still happens.
    pub fn abort(&mut self) -> Result<Vec<SessionEvent>> {
        if !self.phase.in_progress() {
            return Ok(Vec::new());
        }
        info!(question = self.question_number(), "practice session aborted");
        self.end_session(true)
    }

    fn end_session(&mut self, aborted: bool) -> Result<Vec<SessionEvent>> {
        let total_questions = self.question_number();
        let summary = SessionSummary {
            total_questions,
            correct_answers: self.correct_answers,
            wrongly_answered: self.wrongly_answered.clone(),
            aborted,
        };

        self.phase = SessionPhase::Finished;
        self.current_question = None;
        self.summary = Some(summary.clone());

        let mut events = vec![SessionEvent::Finished(summary)];
        if aborted {
            events.push(SessionEvent::CloseRequested {
                after: self.close_delay,
            });
        }

        self.store
            .insert_session_record(Utc::now(), total_questions, self.correct_answers)?;
        if let Some(payout) = self.accrue_rewards()? {
            events.insert(0, SessionEvent::RewardsEarned(payout));
        }

        info!(
            total = total_questions,
            correct = self.correct_answers,
            aborted,
            "practice session finished"
        );
        Ok(events)
    }
}
