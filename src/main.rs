//! RunPod Monitor Bot - Main Entry Point
//!
//! Reports RunPod pods to a Telegram chat on a schedule and lets allowed
//! users list, create, stop and terminate pods from the chat.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::Bot;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use runpod_monitor_bot::commands::CommandHandler;
use runpod_monitor_bot::config::Settings;
use runpod_monitor_bot::provider::{InstanceProvider, RunPodClient};
use runpod_monitor_bot::scheduler::{InstanceMonitor, MonitorMessage, Notifier};
use runpod_monitor_bot::telegram::{self, TelegramNotifier};
use runpod_monitor_bot::wizard::{CreateWizard, InMemorySessionStore};

const EXAMPLE_ENV_PATH: &str = ".env.example";

/// Telegram bot that monitors RunPod pods.
#[derive(Parser, Debug)]
#[command(name = "runpod_monitor")]
#[command(about = "Monitor and manage RunPod pods from Telegram")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write an example .env file and exit.
    #[arg(long)]
    generate_env: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    if args.generate_env {
        return generate_example_env();
    }

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let settings = Settings::from_env().context("Failed to load configuration from environment")?;

    if settings.access.is_unrestricted() {
        warn!("No chat or user allow-list configured: anyone can control this bot");
    } else {
        info!(
            "Access restricted to {} chats and {} users (0 = any)",
            settings.access.chat_count(),
            settings.access.user_count()
        );
    }

    let provider: Arc<dyn InstanceProvider> = Arc::new(
        RunPodClient::new(&settings.provider).context("Failed to create RunPod client")?,
    );

    let bot = Bot::new(settings.bot_token.clone());
    let notifier: Arc<dyn Notifier> =
        Arc::new(TelegramNotifier::new(bot.clone(), settings.notify_chat_id));

    let wizard = CreateWizard::new(
        Arc::clone(&provider),
        Arc::new(InMemorySessionStore::new()),
        settings.preferred_gpus.clone(),
    );
    let handler = Arc::new(CommandHandler::new(
        settings.access.clone(),
        Arc::clone(&provider),
        wizard,
        settings.check_interval_minutes,
    ));

    telegram::register_commands(&bot).await;

    if let Err(e) = notifier.notify("RunPod monitor bot started.").await {
        warn!("Failed to send startup notification: {}", e);
    }

    // Create monitor channel
    let (monitor_tx, monitor_rx) = mpsc::channel::<MonitorMessage>(1);

    let monitor = InstanceMonitor::new(Arc::clone(&provider), Arc::clone(&notifier))
        .with_check_interval(settings.check_interval());

    let monitor_handle = tokio::spawn(async move {
        monitor.run(monitor_rx).await;
    });

    info!("Bot is running. Use Ctrl+C to stop.");

    let outcome = telegram::run(bot, handler, settings.webhook.clone(), &settings.bot_token).await;

    // Cleanup
    info!("Shutting down...");
    let _ = monitor_tx.send(MonitorMessage::Shutdown).await;
    let _ = monitor_handle.await;

    outcome.context("Telegram dispatcher failed")
}

/// Initializes the logging subsystem.
///
/// HTTP client internals are capped at `warn` unless `RUST_LOG` says
/// otherwise.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{level},reqwest=warn,hyper=warn,hyper_util=warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Writes an example `.env` file.
fn generate_example_env() -> Result<()> {
    std::fs::write(EXAMPLE_ENV_PATH, Settings::example_env())
        .with_context(|| format!("Failed to write {EXAMPLE_ENV_PATH}"))?;

    println!("✓ Example configuration written to: {EXAMPLE_ENV_PATH}");
    println!("\nTo use this bot:");
    println!("1. Copy {EXAMPLE_ENV_PATH} to .env");
    println!("2. Fill in RUNPOD_API_KEY, TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID");
    println!("3. Run: runpod_monitor");

    Ok(())
}
