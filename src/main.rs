mod cli;
mod config;
mod engine;
mod error;
mod logging;
mod reconcile;
mod resolver;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Settings;
use dashboard::backend::meraki::MerakiBackend;
use engine::TagPolicy;
use error::AutotagError;
use reconcile::RunOptions;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(logging::level_filter(cli.verbose, cli.quiet), &cli.log_file)
    {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => {
            log::info!("✅ Reconciliation complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            if let Some(autotag) = err.downcast_ref::<AutotagError>() {
                if let AutotagError::Remote(remote) = autotag {
                    log::error!("Cause: {}", remote.category());
                }
                if let Some(advice) = autotag.advice() {
                    log::error!("{advice}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let policy = TagPolicy::new(&cli.cellular_tag, &cli.wifi_tag)?;
    let settings = Settings::from_env()?;

    let mut backend = MerakiBackend::new(&settings.api_key).with_max_retries(cli.max_retries);
    if let Some(api_base) = &settings.api_base {
        log::debug!("Using Dashboard API at {}", api_base);
        backend = backend.with_api_base(api_base);
    }

    let opts = RunOptions {
        org_name: cli.org_name.clone(),
        network_name: cli.network_name.clone(),
        policy,
        prune_wrong_tags: cli.remove_wrong,
        dry_run: cli.dry_run,
    };

    let summary = reconcile::run(&backend, &opts).with_context(|| {
        format!(
            "Failed to reconcile tags in network '{}'",
            cli.network_name
        )
    })?;
    summary.log();

    Ok(())
}
