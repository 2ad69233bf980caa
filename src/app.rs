use crate::args::{Cli, Command};
use crate::config::BotConfig;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::price::HttpPriceSource;
use crate::publish::Publisher;
use crate::responder::CommandResponder;
use crate::scheduler::Scheduler;
use crate::telegram::{BotApiClient, ChatPlatform};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

pub enum Application {
    /// Scheduled updates plus the command responder, until Ctrl-C.
    Run(BotConfig),
    /// A single pipeline run.
    Once(BotConfig),
}

impl Application {
    /// Parses arguments, loads the env file and validates the configuration.
    ///
    /// Any missing required value is fatal here, before anything is started.
    pub fn init() -> Result<Application> {
        let cli = Cli::parse();

        if let Err(err) = dotenvy::from_filename(&cli.env_file) {
            if !err.not_found() {
                return Err(err).with_context(|| {
                    format!("Failed to load env file {}", cli.env_file.display())
                });
            }
        }

        let config = BotConfig::from_env().context("Failed to load configuration")?;

        Ok(match cli.cmd.unwrap_or(Command::Run) {
            Command::Run => Application::Run(config),
            Command::Once => Application::Once(config),
        })
    }

    pub async fn run(self) -> Result<()> {
        match self {
            Self::Run(config) => serve(config).await,
            Self::Once(config) => once(config).await,
        }
    }
}

fn build_pipeline(config: &BotConfig, platform: Arc<dyn ChatPlatform>) -> Result<Pipeline> {
    let source = HttpPriceSource::new(&config.price).context("Failed to set up price source")?;
    let publisher = Publisher::new(platform, &config.target);
    Ok(Pipeline::new(
        Arc::new(source),
        config.templates.clone(),
        publisher,
    ))
}

async fn serve(config: BotConfig) -> Result<()> {
    let platform: Arc<dyn ChatPlatform> = Arc::new(BotApiClient::new(&config.telegram));

    let me = platform
        .get_me()
        .await
        .context("Failed to authenticate with the Telegram Bot API")?;
    info!(
        bot = me.username.as_deref().unwrap_or("<unnamed>"),
        chat = %config.target.chat,
        message_id = config.target.message_id,
        "connected"
    );

    let pipeline = build_pipeline(&config, platform.clone())?;
    let responder = CommandResponder::new(platform, &config.responder, me.username);
    let scheduler = Scheduler::new(config.schedule.clone());

    let pipeline = &pipeline;
    let scheduled = scheduler.run(move || async move {
        pipeline.run_once().await;
    });

    tokio::select! {
        _ = scheduled => {}
        _ = responder.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
    }

    Ok(())
}

async fn once(config: BotConfig) -> Result<()> {
    let platform: Arc<dyn ChatPlatform> = Arc::new(BotApiClient::new(&config.telegram));
    let pipeline = build_pipeline(&config, platform)?;

    match pipeline.run_once().await {
        RunOutcome::FetchFailed(err) => Err(err).context("Price fetch failed"),
        RunOutcome::Published { report, .. } if !report.is_complete() => {
            bail!("Price was fetched but at least one update failed")
        }
        RunOutcome::Published { .. } => Ok(()),
    }
}
