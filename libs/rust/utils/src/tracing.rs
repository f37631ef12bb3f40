use futures::{Future, FutureExt};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Output shape of the stdout layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

pub fn setup_tracing() {
    setup_tracing_with(LogFormat::from_env());
}

pub fn setup_tracing_with(format: LogFormat) {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Ensure the fmt layer logs to the console
    let result = match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                fmt::layer()
                    .with_line_number(true)
                    .compact()
                    .with_writer(std::io::stdout),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_line_number(true)
                    .with_writer(std::io::stdout),
            )
            .try_init(),
    };

    if let Err(e) = result {
        warn!(error = %e, "Tracing subscriber already installed");
    }
}

/// Runs `future` with tracing installed and logs panics instead of letting
/// them unwind past the runtime.
pub async fn run_with_tracing<F, Fut>(future: F) -> anyhow::Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    setup_tracing();

    // Wrap the async block in a catch_unwind
    match std::panic::AssertUnwindSafe(future()).catch_unwind().await {
        Ok(result) => {
            if let Err(e) = &result {
                error!(error = ?e, "Application exited with error");
            }
            result
        }
        Err(e) => {
            capture_panic_details(e);
            Err(anyhow::anyhow!("application panicked"))
        }
    }
}

fn capture_panic_details(e: Box<dyn std::any::Any + Send>) {
    let backtrace = backtrace::Backtrace::new();
    if let Some(s) = e.downcast_ref::<&str>() {
        error!(panic_message = *s, backtrace = ?backtrace, "Panic occurred with message");
    } else if let Some(s) = e.downcast_ref::<String>() {
        error!(panic_message = s, backtrace = ?backtrace, "Panic occurred with message");
    } else {
        error!(backtrace = ?backtrace, "Panic occurred but the payload is not a string");
    }
}
