//! `genesis-distribute` entry point.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use genesis_orchestrator::domain::plan;
use genesis_orchestrator::{DistributionConfig, GenesisError};
use genesis_runtime::report::{render_outcome, render_plan, render_status};
use genesis_runtime::{cli, exit_code, Cli, Command, GenesisRuntime};
use genesis_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info_span, warn, Instrument};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = cli.log_level() {
        telemetry = telemetry.with_log_level(level);
    }
    if cli.json_logs {
        telemetry = telemetry.with_json_logs(true);
    }
    let guard = match init_telemetry(telemetry) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {e}");
            return ExitCode::FAILURE;
        }
    };

    let span = info_span!("genesis", service = %guard.service_name(), command = ?cli.command);

    match execute(&cli).instrument(span).await {
        Ok(code) => code,
        Err(e) => {
            if let Some(GenesisError::NeedsFunding { identity }) = e.downcast_ref::<GenesisError>() {
                eprintln!(
                    "Fund the controlling identity {identity} and run again \
                     (rehearsal ledger: `genesis-distribute fund --amount <units>`)."
                );
            } else {
                error!("{:#}", e);
            }
            exit_code(&e)
        }
    }
}

async fn execute(cli: &Cli) -> Result<ExitCode> {
    let config = DistributionConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match &cli.command {
        Command::Plan => {
            let steps = plan(config.table());
            print!("{}", render_plan(&steps, config.allocations(), config.table()));
            Ok(ExitCode::SUCCESS)
        }
        Command::Run => run(&GenesisRuntime::new(config)?).await,
        Command::Status { json } => {
            let status = GenesisRuntime::new(config)?.status()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print!("{}", render_status(&status));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Fund { identity, amount } => {
            let runtime = GenesisRuntime::new(config)?;
            let _lock = runtime.lock()?;
            let (identity, balance) = runtime.fund(*identity, *amount)?;
            println!("{identity} balance {balance}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { path } => {
            let manifest = GenesisRuntime::new(config)?.verify_manifest(path.as_deref())?;
            println!(
                "manifest for run {} verified (digest {})",
                manifest.run_id(),
                manifest.digest
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(runtime: &GenesisRuntime) -> Result<ExitCode> {
    let _lock = runtime.lock()?;
    let result = tokio::select! {
        result = runtime.run() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    if let Err(e) = runtime.write_metrics() {
        warn!("[genesis] {:#}", e);
    }

    match result {
        Some(outcome) => {
            print!("{}", render_outcome(&outcome?));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            warn!("[genesis] Interrupted; progress is checkpointed, run again to resume");
            Ok(ExitCode::from(cli::INTERRUPTED))
        }
    }
}
