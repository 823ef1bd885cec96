mod app;

use app::MathApp;
use mathetrainer::{AppConfig, PracticeStore, SqliteStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    let config_path = AppConfig::default_path();
    let (config, config_error) = match AppConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    if let Some(err) = config_error {
        warn!(path = %config_path.display(), %err, "using default config");
    }

    let store = SqliteStore::open(&config.database_path).expect("Failed to open database");
    let rewards = store
        .ensure_rewards()
        .expect("Failed to initialize reward ledger");

    info!(
        unicorns = rewards.unicorns,
        bananas = rewards.bananas,
        wrong_answers = store.wrong_answer_count().unwrap_or(0),
        "ready to practice"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Mathetrainer",
        options,
        Box::new(|_cc| Ok(Box::new(MathApp::new(store, config)))),
    )
}
