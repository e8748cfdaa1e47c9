use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use ingest_core::{
    BatchSink, Config, IngestionCycle, OpenWeatherSource, PostgresSink, Scheduler, StdoutSink,
};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::watch;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-ingest", version, about = "Poll city weather and load it into the warehouse")]
pub struct Cli {
    /// Path to the TOML config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll on the configured interval until interrupted.
    Run(SinkArgs),

    /// Run a single cycle and exit.
    Once(SinkArgs),
}

#[derive(Debug, Args)]
pub struct SinkArgs {
    /// Print records as JSON lines instead of writing to the warehouse.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let dry_run = match &self.command {
            Command::Run(args) | Command::Once(args) => args.dry_run,
        };

        let mut config = Config::load(self.config.as_deref())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate(!dry_run).context("Invalid configuration")?;

        let cycle = build_cycle(&config, dry_run)?;
        let cities: Arc<[_]> = config.cities.clone().into();

        match self.command {
            Command::Once(_) => {
                let report = cycle.run(&cities).await;
                report.log();
                if report.is_total_failure() {
                    match report.store_error {
                        Some(err) => bail!("batch store failed: {err}"),
                        None => bail!("every city failed to fetch"),
                    }
                }
            }
            Command::Run(_) => {
                let scheduler = Scheduler::new(cycle, cities, config.interval());
                let (stop, shutdown) = watch::channel(false);

                tokio::spawn(forward_stop_signal(tokio::signal::ctrl_c(), stop));

                let cycles = scheduler.run(shutdown).await;
                tracing::info!(cycles, "weather-ingest stopped");
            }
        }

        Ok(())
    }
}

/// Flip `stop` once `signal` fires. If the listener cannot be installed the
/// sender is kept alive forever, since dropping it would stop the scheduler.
async fn forward_stop_signal<F>(signal: F, stop: watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("stop signal received; finishing current cycle");
            let _ = stop.send(true);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for ctrl-c; stop the process externally");
            std::future::pending::<()>().await;
        }
    }
}

fn build_cycle(config: &Config, dry_run: bool) -> anyhow::Result<IngestionCycle> {
    let source = OpenWeatherSource::from_config(&config.provider)?;

    let sink: Arc<dyn BatchSink> = if dry_run {
        Arc::new(StdoutSink::new())
    } else {
        let sink = PostgresSink::from_config(&config.warehouse)?;
        tracing::info!(table = sink.table(), "writing to warehouse");
        Arc::new(sink)
    };

    Ok(IngestionCycle::new(Arc::new(source), sink, config.provider.timeout()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_run_with_global_flags() {
        let cli = Cli::try_parse_from(["weather-ingest", "run", "--config", "/etc/w.toml", "--json-logs"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/w.toml")));
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Command::Run(SinkArgs { dry_run: false })));
    }

    #[test]
    fn parses_once_dry_run() {
        let cli = Cli::try_parse_from(["weather-ingest", "once", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Command::Once(SinkArgs { dry_run: true })));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["weather-ingest"]).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn signal_listener_failure_keeps_scheduler_running() {
        let (stop, mut shutdown) = watch::channel(false);
        let failed = async { Err::<(), _>(std::io::Error::other("no signal handler")) };
        tokio::spawn(forward_stop_signal(failed, stop));

        let changed = tokio::time::timeout(Duration::from_secs(3600), shutdown.changed()).await;
        assert!(changed.is_err(), "shutdown must not fire without a signal");
        assert!(!*shutdown.borrow());
    }

    #[tokio::test]
    async fn signal_flips_stop() {
        let (stop, mut shutdown) = watch::channel(false);
        tokio::spawn(forward_stop_signal(async { Ok::<(), std::io::Error>(()) }, stop));

        shutdown.changed().await.unwrap();
        assert!(*shutdown.borrow());
    }

    #[tokio::test]
    async fn dry_run_cycle_needs_no_warehouse() {
        let mut config = Config::default();
        config.provider.api_key = Some("KEY".into());
        assert!(build_cycle(&config, true).is_ok());
        assert!(build_cycle(&config, false).is_err());
    }
}
