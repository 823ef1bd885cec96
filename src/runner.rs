//! Drives a [`PracticeSession`] from the host's event loop.
//!
//! The host forwards answers, abort requests and elapsed frame time. The runner slices
//! elapsed time into fixed clock ticks, feeds them to the session timer, and owns the
//! deferred work: the advance after the feedback window and closing an aborted session.

use crate::database::PracticeStore;
use crate::error::Result;
use crate::models::practice_session::TICK_INTERVAL;
use crate::models::{PracticeSession, SessionEvent, SessionPhase};
use crate::scheduler::{Scheduler, TaskHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deferred {
    Advance,
    Close,
}

pub struct SessionRunner<S: PracticeStore> {
    session: PracticeSession<S>,
    scheduler: Scheduler<Deferred>,
    advance_task: Option<TaskHandle>,
    close_task: Option<TaskHandle>,
    close_requested: bool,
    tick_interval: Duration,
    unticked: Duration,
    undelivered: Vec<SessionEvent>,
}

impl<S: PracticeStore> SessionRunner<S> {
    pub fn new(session: PracticeSession<S>) -> Self {
        Self {
            session,
            scheduler: Scheduler::new(),
            advance_task: None,
            close_task: None,
            close_requested: false,
            tick_interval: TICK_INTERVAL,
            unticked: Duration::ZERO,
            undelivered: Vec::new(),
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.tick_interval = interval;
        }
        self
    }

    pub fn session(&self) -> &PracticeSession<S> {
        &self.session
    }

    /// True once an aborted session's close delay has passed.
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn is_finished(&self) -> bool {
        self.session.phase() == SessionPhase::Finished
    }

    pub fn start(&mut self) -> Result<Vec<SessionEvent>> {
        self.scheduler.clear();
        self.advance_task = None;
        self.close_task = None;
        self.close_requested = false;
        self.unticked = Duration::ZERO;
        self.undelivered.clear();

        let result = self.session.start();
        self.reconcile();
        result
    }

    pub fn submit_answer(&mut self, input: &str) -> Result<Vec<SessionEvent>> {
        let result = self.session.submit_answer(input);
        self.reconcile();
        result
    }

    pub fn abort(&mut self) -> Result<Vec<SessionEvent>> {
        let result = self.session.abort();
        self.reconcile();
        result
    }

    /// Processes `elapsed` wall time as a series of fixed clock ticks.
    ///
    /// When a slice fails, the events produced before it are kept and handed out by the
    /// next successful call.
    pub fn tick(&mut self, elapsed: Duration) -> Result<Vec<SessionEvent>> {
        self.unticked += elapsed;
        let mut events = std::mem::take(&mut self.undelivered);

        match self.run_slices(&mut events) {
            Ok(()) => Ok(events),
            Err(err) => {
                self.undelivered = events;
                Err(err)
            }
        }
    }

    /// Stops at the first slice that fails. Every task due in that slice still runs.
    fn run_slices(&mut self, events: &mut Vec<SessionEvent>) -> Result<()> {
        while self.unticked >= self.tick_interval {
            self.unticked -= self.tick_interval;
            let mut failure = None;

            let result = self.session.tick(self.tick_interval);
            self.reconcile();
            match result {
                Ok(produced) => events.extend(produced),
                Err(err) => failure = Some(err),
            }

            for task in self.scheduler.advance(self.tick_interval) {
                let result = self.run(task);
                self.reconcile();
                match result {
                    Ok(produced) => events.extend(produced),
                    Err(err) if failure.is_none() => failure = Some(err),
                    Err(_) => {}
                }
            }

            if let Some(err) = failure {
                return Err(err);
            }
        }
        Ok(())
    }

    fn run(&mut self, task: Deferred) -> Result<Vec<SessionEvent>> {
        debug!(?task, "running deferred task");
        match task {
            Deferred::Advance => {
                self.advance_task = None;
                self.session.advance()
            }
            Deferred::Close => {
                self.close_task = None;
                self.close_requested = true;
                Ok(Vec::new())
            }
        }
    }

    /// Aligns scheduled work with the session phase. Runs after every session call,
    /// including failed ones, so a store error cannot strand the session in feedback.
    fn reconcile(&mut self) {
        match self.session.phase() {
            SessionPhase::Feedback if self.advance_task.is_none() => {
                let delay = self.session.feedback_delay();
                self.advance_task = Some(self.scheduler.schedule(delay, Deferred::Advance));
            }
            SessionPhase::Finished => {
                if let Some(handle) = self.advance_task.take() {
                    self.scheduler.cancel(handle);
                }
                let aborted = self.session.summary().is_some_and(|s| s.aborted);
                if aborted && self.close_task.is_none() && !self.close_requested {
                    let delay = self.session.close_delay();
                    self.close_task = Some(self.scheduler.schedule(delay, Deferred::Close));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteStore;
    use crate::database::failing::FailingStore;
    use crate::models::Settings;

    fn runner(settings: Settings) -> (SessionRunner<SqliteStore>, SqliteStore) {
        let store = SqliteStore::in_memory().unwrap();
        store.ensure_rewards().unwrap();
        let session = PracticeSession::new(settings, store.clone()).with_seed(7);
        (SessionRunner::new(session), store)
    }

    fn current_answer(runner: &SessionRunner<SqliteStore>) -> String {
        runner
            .session()
            .current_question()
            .unwrap()
            .answer
            .to_string()
    }

    #[test]
    fn test_feedback_window_then_next_question() {
        let (mut runner, _) = runner(Settings {
            question_count: 3,
            ..Settings::default()
        });
        runner.start().unwrap();
        runner.submit_answer(&current_answer(&runner)).unwrap();
        assert_eq!(runner.session().phase(), SessionPhase::Feedback);

        let events = runner.tick(Duration::from_millis(900)).unwrap();
        assert!(events.is_empty());
        assert_eq!(runner.session().phase(), SessionPhase::Feedback);

        let events = runner.tick(Duration::from_millis(100)).unwrap();
        assert!(matches!(events.as_slice(), [SessionEvent::QuestionReady(_)]));
        assert_eq!(runner.session().question_number(), 2);
    }

    #[test]
    fn test_full_session_through_ticks() {
        let (mut runner, store) = runner(Settings {
            question_count: 4,
            ..Settings::default()
        });
        runner.start().unwrap();

        while !runner.is_finished() {
            runner.submit_answer(&current_answer(&runner)).unwrap();
            runner.tick(Duration::from_secs(1)).unwrap();
        }

        assert!(!runner.close_requested());
        let record = &store.session_records().unwrap()[0];
        assert_eq!((record.total_questions, record.correct_answers), (4, 4));
    }

    #[test]
    fn test_abort_during_feedback_cancels_advance_and_closes() {
        let (mut runner, store) = runner(Settings {
            question_count: 5,
            ..Settings::default()
        });
        runner.start().unwrap();
        runner.submit_answer("-1").unwrap();
        runner.abort().unwrap();

        let events = runner.tick(Duration::from_millis(400)).unwrap();
        assert!(events.is_empty());
        assert!(!runner.close_requested());

        runner.tick(Duration::from_millis(100)).unwrap();
        assert!(runner.close_requested());
        assert_eq!(runner.session().question_number(), 1);
        assert_eq!(store.session_records().unwrap().len(), 1);
    }

    #[test]
    fn test_partial_ticks_accumulate() {
        let (mut runner, _) = runner(Settings {
            use_timer: true,
            time_limit_minutes: 1,
            ..Settings::default()
        });
        runner.start().unwrap();

        for _ in 0..10 {
            runner.tick(Duration::from_millis(50)).unwrap();
        }
        let timer = runner.session().timer().unwrap();
        assert_eq!(timer.remaining, Duration::from_millis(59_500));
    }

    #[test]
    fn test_timeout_through_runner() {
        let (mut runner, store) = runner(Settings {
            use_timer: true,
            time_limit_minutes: 1,
            ..Settings::default()
        });
        runner.start().unwrap();

        let events = runner.tick(Duration::from_secs(61)).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Finished(s) if !s.aborted)));
        assert!(runner.is_finished());
        assert!(!runner.close_requested());
        assert_eq!(store.session_records().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_slice_keeps_earlier_events() {
        let store = FailingStore::new(SqliteStore::in_memory().unwrap());
        store.ensure_rewards().unwrap();
        let settings = Settings {
            question_count: 5,
            use_timer: true,
            time_limit_minutes: 1,
            ..Settings::default()
        };
        let session = PracticeSession::new(settings, store.clone()).with_seed(7);
        let mut runner = SessionRunner::new(session);
        runner.start().unwrap();

        let answer = runner.session().current_question().unwrap().answer;
        runner.submit_answer(&answer.to_string()).unwrap();
        store.fail_session_records(true);

        // One second of feedback, then the full minute runs out and the history write fails.
        assert!(runner.tick(Duration::from_secs(62)).is_err());
        assert!(runner.is_finished());
        assert_eq!(runner.session().question_number(), 2);

        let events = runner.tick(Duration::ZERO).unwrap();
        assert!(matches!(events.as_slice(), [SessionEvent::QuestionReady(_)]));
        assert!(runner.tick(Duration::ZERO).unwrap().is_empty());
    }
}
