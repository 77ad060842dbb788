//! Structured logging.
//!
//! Plain-text output for operators, JSON for log shipping. Every line carries
//! the `service` field from [`TelemetryConfig::service_name`] through a root
//! span entered by the binary. Logs go to stderr; stdout is left for
//! command output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global `tracing` subscriber.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log filter: {e}")))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(config.ansi)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging configured"
    );

    Ok(())
}

/// Log an orchestration step event with standard fields.
#[macro_export]
macro_rules! log_step_event {
    ($level:ident, $step:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            step = %$step,
            $($($field)*,)?
            $msg
        )
    };
}
