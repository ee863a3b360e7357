//! services/planner/src/bin/planner.rs

use clap::Parser;
use lesson_planner_core::{
    library::Library,
    ports::{Confirmation, LessonGenerator, Preconfirmed},
    store::RecordStore,
};
use planner_lib::{
    adapters::{DbAdapter, GeminiLessonAdapter, OpenAiLessonAdapter},
    cli::{execute, App, Cli},
    config::{Config, LlmProvider},
    console::PromptConfirmation,
    error::AppError,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(provider = ?config.provider, model = %config.lesson_model, "Configuration loaded.");

    // --- 2. Connect to Database & Run Migrations ---
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool, config.storage_quota_bytes));
    db_adapter.run_migrations().await?;

    // --- 3. Initialize the Lesson Generator ---
    let api_key = config.provider_api_key();
    if api_key.is_none() {
        warn!("No API key configured; generation and refinement will fail until one is set.");
    }
    let generator: Arc<dyn LessonGenerator> = match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiLessonAdapter::from_api_key(
            api_key,
            config.lesson_model.clone(),
        )),
        LlmProvider::Gemini => Arc::new(GeminiLessonAdapter::new(
            api_key,
            config.lesson_model.clone(),
        )),
    };

    // --- 4. Load the Library and Run the Command ---
    let library = Library::open(RecordStore::new(db_adapter)).await;
    let confirm: Box<dyn Confirmation> = if cli.yes {
        Box::new(Preconfirmed)
    } else {
        Box::new(PromptConfirmation::stdio())
    };
    let mut app = App {
        library,
        generator,
        confirm,
        backup_dir: config.backup_dir.clone(),
    };

    let output = execute(&mut app, cli.command).await?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
