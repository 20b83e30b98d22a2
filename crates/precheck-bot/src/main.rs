//! Precheck Verify Bot - Main entry point.

use anyhow::Context;
use onebot_client::{EventReceiver, OneBotClient};
use precheck_bot::bot::{Bot, DRAIN_MARGIN};
use precheck_bot::commands::{CommandHandler, VerifyCodeHandler};
use precheck_bot::config::{Config, LogFormat};
use precheck_bot::error::AppResult;
use precheck_client::PrecheckClient;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level, config.bot.log_format);

    info!("Starting Precheck Verify Bot...");

    if !config.has_secret() {
        warn!("PRECHECK_BOT_SECRET is not set; code requests will be refused");
    }

    // Initialize clients
    let precheck = Arc::new(PrecheckClient::new(
        &config.api_url,
        config.bot_secret.clone(),
        config.timeout,
    )?);

    let onebot = OneBotClient::new(&config.onebot.api_url, config.onebot.access_token.clone())?;

    // Health checks
    if onebot.health_check().await {
        info!("OneBot API healthy");
    } else {
        warn!(
            "OneBot API not reachable at {} - replies will fail until it is up",
            onebot.base_url()
        );
    }

    if !config.onebot.verifies_signatures() {
        warn!("PRECHECK_ONEBOT__SECRET is not set; reported events are not authenticated");
    }

    // Create command handlers
    let handlers: Vec<Arc<dyn CommandHandler>> = vec![Arc::new(VerifyCodeHandler::new(
        precheck.clone(),
        config.bot.trigger.clone(),
        config.bot.locale,
    ))];
    let bot = Bot::new(
        handlers,
        onebot,
        config.bot.locale.unexpected(),
        config.timeout + DRAIN_MARGIN,
    );

    info!("Registered {} command handlers", bot.handler_count());
    info!("Verification endpoint: {}", precheck.endpoint());
    info!("Listening for messages...");

    // Start message receiver
    let receiver = EventReceiver::new(
        config.onebot.listen_addr()?,
        config.onebot.event_path.clone(),
        config.onebot.secret.clone(),
    );
    let stream = receiver.stream().await?;

    // Main message loop
    bot.run(stream, async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}
