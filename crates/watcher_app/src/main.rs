mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;
use watcher_engine::{Poller, ReqwestFetcher, SmtpNotifier};
use watcher_logging::{watch_info, watch_warn};

use crate::config::WatchConfig;
use crate::logging::LogDestination;

/// Polls a page and emails an alert when a rule matches its positive value.
#[derive(Debug, Parser)]
#[command(name = "watcher", version)]
struct Cli {
    /// Path to the RON watch configuration.
    #[arg(short, long)]
    config: PathBuf,

    /// Where log lines go.
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    /// Include per-cycle debug lines.
    #[arg(short, long)]
    verbose: bool,

    /// Run a single cycle right away and exit.
    #[arg(long)]
    once: bool,

    /// Overrides `smtp.credential` from the config file.
    #[arg(long, env = "WATCHER_SMTP_CREDENTIAL", hide_env_values = true)]
    smtp_credential: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    let mut config = WatchConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(credential) = cli.smtp_credential {
        config.smtp.credential = credential;
    }

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(watch(config, cli.once))
}

async fn watch(config: WatchConfig, once: bool) -> anyhow::Result<()> {
    let notifier = SmtpNotifier::new(&config.endpoint(), config.notify_settings())
        .context("configuring SMTP relay")?;
    let fetcher = ReqwestFetcher::new(config.fetch_settings());
    let poller = Poller::new(
        config.rule_set(),
        Arc::new(fetcher),
        Arc::new(notifier),
        config.poll_settings(),
    );

    if once {
        let stats = poller.run_once().await;
        watch_info!("Single cycle finished: {:?}", stats);
        if stats.fetch_failures > 0 {
            anyhow::bail!("fetching {} failed", config.target_url);
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    watch_info!("Interrupt received; stopping after the current cycle");
                    cancel.cancel();
                }
                Err(err) => watch_warn!("Cannot listen for Ctrl-C: {}", err),
            }
        }
    });

    let stats = poller.run(cancel).await;
    watch_info!("Final counters: {:?}", stats);
    Ok(())
}
