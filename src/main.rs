use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use mario::bot::Bot;
use mario::commands::default_registry;
use mario::config::Config;
use mario::slack;

/// Log to stdout and to `<log_dir>/mario.log`. Keep the guard alive for the file writer.
fn init_logging(config: &Config) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log dir {}", config.log_dir.display()))?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_dir.join("mario.log"))
        .context("failed to open log file")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let _guard = init_logging(&config)?;

    info!("🚀 Starting {}...", config.bot_name);
    info!("Slack API: {}", config.api_base_url);
    if config.ci.token.is_empty() {
        warn!("No Wercker token set, `apps` will only see public apps");
    }

    let (transport, self_id) = slack::connect(&config.api_base_url, &config.token)
        .await
        .context("failed to connect to Slack")?;
    info!("Connected as {}", slack::mention_token(&self_id));

    let registry = default_registry(&config)?;
    let bot = Bot::new(transport, registry, &self_id, config.bot_name.clone())
        .with_send_error_policy(config.on_send_error);

    tokio::select! {
        result = bot.run() => {
            result.context("bot stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("👋 Interrupted, shutting down");
        }
    }
    Ok(())
}
