//! Command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use genesis_orchestrator::GenesisError;
use shared_types::PublicIdentity;

/// Genesis distribution for a fixed-supply asset
#[derive(Parser, Debug)]
#[command(name = "genesis-distribute")]
#[command(about = "Create an asset, issue its entire supply across allocation categories, and lock issuance")]
#[command(version)]
pub struct Cli {
    /// Distribution configuration (TOML)
    #[arg(short, long, default_value = "genesis.toml", env = "GD_CONFIG")]
    pub config: PathBuf,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the step plan and per-category quantities; touches nothing
    Plan,

    /// Execute (or resume) the distribution
    Run,

    /// Show progress recorded in the checkpoint
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Credit native units on the rehearsal ledger
    Fund {
        /// Identity to credit; defaults to the controlling identity
        #[arg(long)]
        identity: Option<PublicIdentity>,

        /// Amount in the ledger's native units
        #[arg(long)]
        amount: u64,
    },

    /// Check a run manifest's digest
    Verify {
        /// Manifest path; defaults to the one in the data directory
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Log filter implied by `-v`, unless the environment sets one.
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

/// Process exit status.
///
/// | Code | Meaning |
/// |------|---------|
/// | 0 | success |
/// | 1 | failure needing operator attention |
/// | 2 | controlling identity needs funding |
/// | 3 | confirmation timed out; safe to re-run |
/// | 4 | another run holds the lock |
/// | 130 | interrupted; safe to re-run |
pub fn exit_code(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(exit_status(err))
}

pub fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<GenesisError>() {
        Some(GenesisError::NeedsFunding { .. }) => 2,
        Some(e) if e.is_retryable() => 3,
        Some(GenesisError::RunLocked { .. }) => 4,
        _ => 1,
    }
}

pub const INTERRUPTED: u8 = 130;
