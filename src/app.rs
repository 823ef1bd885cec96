//! Main application UI.
//! A thin egui layer over the practice engine: it forwards input to the session runner
//! and renders whatever state the runner reports.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use mathetrainer::export::json::{PracticeReport, export_report_to_path};
use mathetrainer::models::settings::{MAX_QUESTION_COUNT, MAX_TIME_LIMIT_MINUTES};
use mathetrainer::models::{Operator, ScoreBand, SessionSummary};
use mathetrainer::{
    AppConfig, PracticeSession, PracticeStore, SessionEvent, SessionPhase, SessionRunner,
    Settings, SqliteStore,
};
use std::time::Instant;
use tracing::error;

/// Application screen states
#[derive(Default, PartialEq)]
enum AppScreen {
    #[default]
    Start,
    Settings,
    Practice,
    Summary,
    Statistics,
}

/// Main application state
pub struct MathApp {
    store: SqliteStore,
    config: AppConfig,
    current_screen: AppScreen,

    settings_form: Settings,
    settings_error: Option<String>,

    runner: Option<SessionRunner<SqliteStore>>,
    answer_input: String,
    last_feedback: Option<(bool, i64)>,
    show_abort_dialog: bool,
    last_frame: Option<Instant>,

    summary: Option<SessionSummary>,
    message: Option<String>,
}

/// Formats a stored UTC timestamp as local YYYY-MM-DD HH:MM
fn format_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn band_color(band: ScoreBand) -> egui::Color32 {
    match band {
        ScoreBand::Good => egui::Color32::from_rgb(40, 160, 60),
        ScoreBand::Fair => egui::Color32::from_rgb(230, 140, 20),
        ScoreBand::Poor => egui::Color32::from_rgb(200, 50, 50),
    }
}

fn operator_label(op: Operator) -> &'static str {
    match op {
        Operator::Add => "Addition (+)",
        Operator::Sub => "Subtraction (-)",
        Operator::Mul => "Multiplication (x)",
        Operator::Div => "Division (÷)",
    }
}

impl eframe::App for MathApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drive_session(ctx);

        match self.current_screen {
            AppScreen::Start => self.render_start_screen(ctx),
            AppScreen::Settings => self.render_settings_screen(ctx),
            AppScreen::Practice => self.render_practice_screen(ctx),
            AppScreen::Summary => self.render_summary_screen(ctx),
            AppScreen::Statistics => self.render_statistics_screen(ctx),
        }

        if self.show_abort_dialog {
            egui::Window::new("Stop practicing?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Your progress so far will be saved.");
                    ui.horizontal(|ui| {
                        if ui.button("Keep going").clicked() {
                            self.show_abort_dialog = false;
                        }
                        if ui.button("Stop").clicked() {
                            self.show_abort_dialog = false;
                            self.abort_session();
                        }
                    });
                });
        }

        if let Some(message) = self.message.clone() {
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.message = None;
                    }
                });
        }
    }
}

impl MathApp {
    pub fn new(store: SqliteStore, config: AppConfig) -> Self {
        Self {
            store,
            settings_form: config.defaults.clone(),
            config,
            current_screen: AppScreen::Start,
            settings_error: None,
            runner: None,
            answer_input: String::new(),
            last_feedback: None,
            show_abort_dialog: false,
            last_frame: None,
            summary: None,
            message: None,
        }
    }

    fn report_error(&mut self, context: &str, err: mathetrainer::Error) {
        error!(%err, "{context}");
        self.message = Some(format!("{context}: {err}"));
    }

    /// Feeds elapsed frame time to the runner and keeps the frame clock going
    fn drive_session(&mut self, ctx: &egui::Context) {
        let Some(runner) = self.runner.as_mut() else {
            self.last_frame = None;
            return;
        };

        let now = Instant::now();
        let elapsed = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);

        let result = runner.tick(elapsed);
        let close = runner.close_requested();
        match result {
            Ok(events) => self.handle_events(events),
            Err(err) => self.report_error("Saving progress failed", err),
        }

        if close {
            self.runner = None;
            self.current_screen = AppScreen::Start;
        } else {
            ctx.request_repaint_after(self.config.tick_interval());
        }
    }

    fn handle_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::QuestionReady(_) => {
                    self.answer_input.clear();
                    self.last_feedback = None;
                }
                SessionEvent::Feedback {
                    correct,
                    correct_answer,
                    ..
                } => self.last_feedback = Some((correct, correct_answer)),
                SessionEvent::RewardsEarned(_) => {}
                SessionEvent::Finished(summary) => {
                    if !summary.aborted {
                        self.summary = Some(summary);
                        self.runner = None;
                        self.current_screen = AppScreen::Summary;
                    }
                }
                SessionEvent::CloseRequested { .. } => {}
            }
        }
    }

    fn start_session(&mut self) {
        let available = match self.store.wrong_answer_count() {
            Ok(count) => count,
            Err(err) => return self.report_error("Could not read wrong answers", err),
        };
        if let Err(err) = self.settings_form.validate(available) {
            self.settings_error = Some(err.to_string());
            return;
        }
        self.settings_error = None;

        let session = PracticeSession::new(self.settings_form.clone(), self.store.clone())
            .with_delays(self.config.feedback_delay(), self.config.close_delay());
        let mut runner =
            SessionRunner::new(session).with_tick_interval(self.config.tick_interval());

        match runner.start() {
            Ok(events) => {
                self.runner = Some(runner);
                self.summary = None;
                self.show_abort_dialog = false;
                self.current_screen = AppScreen::Practice;
                self.handle_events(events);
            }
            Err(err) => self.report_error("Could not start practice", err),
        }
    }

    fn submit_answer(&mut self) {
        let Some(runner) = self.runner.as_mut() else {
            return;
        };
        let result = runner.submit_answer(&self.answer_input);
        match result {
            Ok(events) => self.handle_events(events),
            Err(err) => self.report_error("Saving the answer failed", err),
        }
    }

    fn abort_session(&mut self) {
        let Some(runner) = self.runner.as_mut() else {
            return;
        };
        let result = runner.abort();
        match result {
            Ok(events) => self.handle_events(events),
            Err(err) => self.report_error("Saving the session failed", err),
        }
    }

    fn export_report(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("mathetrainer-report.json")
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        let result = PracticeReport::collect(&self.store)
            .and_then(|report| export_report_to_path(&report, &path));
        match result {
            Ok(()) => self.message = Some(format!("Report saved to {}", path.display())),
            Err(err) => self.report_error("Export failed", err),
        }
    }

    /// Renders the start screen with rewards and navigation
    fn render_start_screen(&mut self, ctx: &egui::Context) {
        let rewards = self.store.load_rewards().ok().flatten().unwrap_or_default();
        let wrong_count = self.store.wrong_answer_count().unwrap_or(0);

        let mut action_new = false;
        let mut action_wrong_only = false;
        let mut action_stats = false;
        let mut action_export = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                ui.heading("Mathetrainer");
                ui.add_space(10.0);
                ui.label(
                    egui::RichText::new(format!(
                        "🦄 {}    🍌 {}",
                        rewards.unicorns, rewards.bananas
                    ))
                    .size(24.0),
                );
                ui.add_space(20.0);

                if ui.button("Start new practice").clicked() {
                    action_new = true;
                }
                if ui
                    .add_enabled(
                        wrong_count > 0,
                        egui::Button::new(format!("Practice wrong answers ({wrong_count})")),
                    )
                    .clicked()
                {
                    action_wrong_only = true;
                }
                if ui.button("My statistics").clicked() {
                    action_stats = true;
                }
                if ui.button("Export report").clicked() {
                    action_export = true;
                }
            });
        });

        if action_new {
            self.settings_form = Settings {
                wrong_answers_only: false,
                ..self.config.defaults.clone()
            };
            self.settings_error = None;
            self.current_screen = AppScreen::Settings;
        }
        if action_wrong_only {
            self.settings_form = Settings::wrong_answers_only(wrong_count);
            self.settings_error = None;
            self.current_screen = AppScreen::Settings;
        }
        if action_stats {
            self.current_screen = AppScreen::Statistics;
        }
        if action_export {
            self.export_report();
        }
    }

    /// Renders the session settings form
    fn render_settings_screen(&mut self, ctx: &egui::Context) {
        let wrong_count = self.store.wrong_answer_count().unwrap_or(0);
        let wrong_only = self.settings_form.wrong_answers_only;

        let mut action_start = false;
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let form = &mut self.settings_form;
            ui.heading("Settings");
            ui.separator();

            ui.label("What do you want to practice?");
            ui.add_enabled_ui(!wrong_only, |ui| {
                for op in Operator::ALL {
                    let mut enabled = form.operators().contains(&op);
                    if ui.checkbox(&mut enabled, operator_label(op)).changed() {
                        form.set_operator(op, enabled);
                    }
                }
            });

            if !wrong_only && wrong_count > 0 {
                ui.checkbox(
                    &mut form.include_wrong_answers,
                    format!("Mix in wrong answers ({wrong_count} available)"),
                );
            }
            ui.separator();

            let max_count = if wrong_only {
                (wrong_count as u32).clamp(1, MAX_QUESTION_COUNT)
            } else {
                MAX_QUESTION_COUNT
            };
            ui.add(egui::Slider::new(&mut form.question_count, 1..=max_count).text("Questions"));
            if wrong_only {
                ui.label(format!(
                    "You can practice at most {wrong_count} wrongly answered questions."
                ));
            }
            ui.separator();

            ui.checkbox(&mut form.use_timer, "Use a time limit");
            if form.use_timer {
                ui.add(
                    egui::Slider::new(&mut form.time_limit_minutes, 1..=MAX_TIME_LIMIT_MINUTES)
                        .text("Minutes"),
                );
            }

            if form.use_addition || form.use_subtraction {
                ui.horizontal(|ui| {
                    ui.label("Numbers per question:");
                    ui.radio_value(&mut form.use_three_operands, false, "2 (5 + 3)");
                    ui.radio_value(&mut form.use_three_operands, true, "3 (5 + 3 + 2)");
                });
            }
            ui.separator();

            if let Some(err) = &self.settings_error {
                ui.colored_label(egui::Color32::RED, err);
            }

            ui.horizontal(|ui| {
                if ui.button("Back").clicked() {
                    action_back = true;
                }
                if ui.button("Start practice!").clicked() {
                    action_start = true;
                }
            });
        });

        if action_back {
            self.current_screen = AppScreen::Start;
        }
        if action_start {
            self.start_session();
        }
    }

    /// Renders the question, answer field, feedback and timer bar
    fn render_practice_screen(&mut self, ctx: &egui::Context) {
        let Some(runner) = self.runner.as_ref() else {
            self.current_screen = AppScreen::Start;
            return;
        };
        let session = runner.session();
        let phase = session.phase();
        let question_text = session
            .current_question()
            .map(|q| q.text.clone())
            .unwrap_or_default();
        let progress = format!(
            "Question {} of {}",
            session.question_number(),
            session.settings().question_count
        );
        let timer = session.timer();
        let feedback = self.last_feedback;

        let mut action_submit = false;
        let mut action_abort = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(progress);
                if ui.button("Stop").clicked() {
                    action_abort = true;
                }
            });
            ui.separator();

            ui.vertical_centered(|ui| {
                ui.add_space(30.0);
                ui.label(egui::RichText::new(&question_text).size(48.0).strong());
                ui.add_space(20.0);

                let response = ui.add_enabled(
                    phase == SessionPhase::AwaitingAnswer,
                    egui::TextEdit::singleline(&mut self.answer_input)
                        .hint_text("Your answer")
                        .font(egui::TextStyle::Heading),
                );
                if phase == SessionPhase::AwaitingAnswer && !response.has_focus() {
                    response.request_focus();
                }
                let enter = ui.input(|i| i.key_pressed(egui::Key::Enter));

                let can_submit =
                    phase == SessionPhase::AwaitingAnswer && !self.answer_input.is_empty();
                if ui
                    .add_enabled(can_submit, egui::Button::new("Confirm"))
                    .clicked()
                    || (can_submit && enter)
                {
                    action_submit = true;
                }

                ui.add_space(20.0);
                if let (SessionPhase::Feedback, Some((correct, answer))) = (phase, feedback) {
                    if correct {
                        ui.colored_label(band_color(ScoreBand::Good), "Correct! 🦄");
                    } else {
                        ui.colored_label(
                            band_color(ScoreBand::Poor),
                            format!("Wrong! 🍌  The answer is {answer}."),
                        );
                    }
                }
            });

            if let Some(timer) = timer {
                ui.add_space(20.0);
                let color = if timer.is_running_low() {
                    egui::Color32::RED
                } else {
                    egui::Color32::from_rgb(60, 120, 220)
                };
                ui.add(
                    egui::ProgressBar::new(timer.fraction_remaining())
                        .fill(color)
                        .text(format!("{}s", timer.remaining.as_secs())),
                );
            }
        });

        if action_submit {
            self.submit_answer();
        }
        if action_abort {
            self.show_abort_dialog = true;
        }
    }

    /// Renders the end-of-session summary
    fn render_summary_screen(&mut self, ctx: &egui::Context) {
        let Some(summary) = self.summary.clone() else {
            self.current_screen = AppScreen::Start;
            return;
        };
        let mut action_done = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Practice finished!");
                ui.add_space(20.0);
                ui.label(
                    egui::RichText::new(format!("{:.0}%", summary.score_percentage()))
                        .size(40.0)
                        .color(band_color(summary.band())),
                );
                ui.label(format!(
                    "You got {} of {} right.",
                    summary.correct_answers, summary.total_questions
                ));
            });

            if !summary.wrongly_answered.is_empty() {
                ui.separator();
                ui.label("Keep practicing these:");
                egui::ScrollArea::vertical()
                    .id_source("wrongly_answered")
                    .max_height(250.0)
                    .show(ui, |ui| {
                        for question in &summary.wrongly_answered {
                            ui.label(question.solved_text());
                        }
                    });
            }

            ui.add_space(20.0);
            if ui.button("Done").clicked() {
                action_done = true;
            }
        });

        if action_done {
            self.summary = None;
            self.current_screen = AppScreen::Start;
        }
    }

    /// Renders long-term statistics and session history
    fn render_statistics_screen(&mut self, ctx: &egui::Context) {
        let stats = self.store.statistics().unwrap_or_default();
        let records = self.store.session_records().unwrap_or_default();

        let mut action_back = false;
        let mut action_clear = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("My statistics");
            ui.separator();

            ui.label(format!("All questions: {}", stats.total_questions));
            ui.colored_label(
                band_color(ScoreBand::Good),
                format!("Correct: {}", stats.total_correct),
            );
            ui.colored_label(
                band_color(ScoreBand::Poor),
                format!("Wrong: {}", stats.total_wrong()),
            );
            ui.label(format!("Ratio: {:.1}%", stats.overall_ratio()));
            ui.separator();

            ui.heading(format!("Sessions ({})", records.len()));
            if records.is_empty() {
                ui.label(egui::RichText::new("You have not finished a practice yet.").italics());
            }
            egui::ScrollArea::vertical()
                .id_source("session_history")
                .max_height(350.0)
                .show(ui, |ui| {
                    for record in &records {
                        ui.horizontal(|ui| {
                            ui.label(format_date(record.date));
                            ui.label(format!(
                                "Score: {} / {}",
                                record.correct_answers, record.total_questions
                            ));
                            ui.colored_label(
                                band_color(record.band()),
                                format!("{:.0}%", record.score_percentage()),
                            );
                        });
                    }
                });

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Back").clicked() {
                    action_back = true;
                }
                if ui.button("Clear history").clicked() {
                    action_clear = true;
                }
            });
        });

        if action_back {
            self.current_screen = AppScreen::Start;
        }
        if action_clear {
            if let Err(err) = self.store.clear_history() {
                self.report_error("Clearing history failed", err);
            }
        }
    }
}
