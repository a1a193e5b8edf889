//! Unified logging integration
//!
//! Installs a `tracing` subscriber once per process. With the `ftlog` feature the
//! ftlog backend is used instead.

#[cfg(not(feature = "ftlog"))]
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging. Safe to call more than once; only the first call has effect.
pub fn init_logging() {
    INIT.call_once(|| {
        #[cfg(feature = "ftlog")]
        {
            init_ftlog();
        }

        #[cfg(not(feature = "ftlog"))]
        {
            init_tracing();
        }
    });
}

#[cfg(feature = "ftlog")]
fn init_ftlog() {
    let logger = ftlog::builder()
        .max_log_level(ftlog::LevelFilter::Debug)
        .bounded(100000, false)
        .utc()
        .build();

    match logger.map(|logger| logger.init()) {
        // The guard flushes on drop; logging lives for the whole process.
        Ok(Ok(guard)) => std::mem::forget(guard),
        Ok(Err(e)) => eprintln!("ftlog already initialized: {e}"),
        Err(e) => eprintln!("ftlog initialization failed: {e}"),
    }
}

#[cfg(not(feature = "ftlog"))]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    // Another subscriber may already be installed (e.g. by a test harness).
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::info!("📝 Initialized tracing logging");
    }
}

/// Log how long an operation took, in μs or ms depending on magnitude
#[macro_export]
macro_rules! log_latency {
    ($operation:expr, $duration_micros:expr) => {
        if $duration_micros < 1000 {
            tracing::debug!("⚡ {} completed in {}μs", $operation, $duration_micros);
        } else {
            tracing::info!("⚡ {} completed in {:.3}ms", $operation, $duration_micros as f64 / 1000.0);
        }
    };
}

/// Log one outbound venue call
#[macro_export]
macro_rules! log_dispatch {
    ($request_id:expr, $venue:expr, $channel:expr, $method:expr, $path:expr) => {
        tracing::debug!(request_id = %$request_id, venue = %$venue, channel = %$channel, "📡 {} {}", $method, $path);
    };
}

#[macro_export]
macro_rules! log_order {
    ($action:expr, $order_id:expr, $pair:expr) => {
        tracing::info!("📋 ORDER {}: {} ({})", $action, $order_id, $pair);
    };
}

#[macro_export]
macro_rules! log_error {
    ($operation:expr, $error:expr) => {
        tracing::error!("❌ {} failed: {}", $operation, $error);
    };
}
