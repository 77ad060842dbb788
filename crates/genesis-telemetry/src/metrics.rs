//! Prometheus metrics for a genesis distribution run.
//!
//! All metrics follow the naming convention: `gd_<area>_<metric>_<unit>`
//!
//! A run is short-lived, so nothing is scraped: the binary renders the
//! registry in text exposition format when it exits.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Steps executed against the ledger, by step kind
    pub static ref STEPS_COMPLETED: IntCounterVec = IntCounterVec::new(
        Opts::new("gd_steps_completed_total", "Orchestration steps confirmed in this run"),
        &["step"]  // asset_init, provision, issue, finalize, schedule_release, report
    ).expect("metric creation failed");

    /// Steps skipped because the checkpoint already recorded them
    pub static ref STEPS_SKIPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("gd_steps_skipped_total", "Orchestration steps skipped on resume"),
        &["step"]
    ).expect("metric creation failed");

    /// Smallest units issued in this run
    pub static ref UNITS_ISSUED: IntCounter = IntCounter::new(
        "gd_issuance_units_total",
        "Smallest asset units issued and confirmed in this run"
    ).expect("metric creation failed");

    /// Transactions submitted to the ledger
    pub static ref TRANSACTIONS_SUBMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("gd_ledger_transactions_submitted_total", "Signed operations submitted"),
        &["operation"]
    ).expect("metric creation failed");

    /// Time spent waiting for ledger confirmation
    pub static ref CONFIRMATION_WAIT: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "gd_ledger_confirmation_wait_seconds",
            "Time between submission and observed confirmation"
        ).buckets(exponential_buckets(0.01, 2.0, 14).expect("static bucket layout"))
    ).expect("metric creation failed");

    /// Run failures by error kind
    pub static ref RUN_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("gd_run_failures_total", "Aborted runs by error kind"),
        &["kind"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(STEPS_COMPLETED.clone()),
        Box::new(STEPS_SKIPPED.clone()),
        Box::new(UNITS_ISSUED.clone()),
        Box::new(TRANSACTIONS_SUBMITTED.clone()),
        Box::new(CONFIRMATION_WAIT.clone()),
        Box::new(RUN_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
