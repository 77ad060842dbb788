//! # Genesis Runtime
//!
//! The `genesis-distribute` executable and the wiring it uses.
//!
//! ## Modules
//!
//! - `cli` - argument parsing and exit codes
//! - `runtime` - file-backed adapters around the orchestrator
//! - `report` - text output for `plan`, `status` and `run`
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments and load configuration (file, then `GD_*` overrides)
//! 2. Initialize logging and register metrics
//! 3. Take the run lock on the data directory (`run`, `fund`)
//! 4. Execute the command; `run` stops cleanly on Ctrl+C
//! 5. Write `metrics.prom` and exit with a status that says whether a
//!    re-run is safe

pub mod cli;
pub mod report;
pub mod runtime;

pub use cli::{exit_code, exit_status, Cli, Command};
pub use runtime::{FileOrchestrator, GenesisRuntime};
