//! Timer-enabled monoio runtime
//!
//! Rate limiting waits and dispatch timeouts rely on the monoio timer, so every
//! runtime the exchange layer runs on is built with `enable_timer()`. The fusion
//! driver uses io_uring where the kernel offers it and falls back to epoll otherwise.

use monoio::{FusionDriver, RuntimeBuilder};
use std::future::Future;
use tracing::info;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Thread name used in logs
    pub thread_name: String,
    /// io_uring submission queue entries
    pub entries: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name: "multivenue-main".to_string(),
            entries: 256,
        }
    }
}

/// Thread-per-core runtime wrapper for the exchange layer
pub struct VenueRuntime {
    config: RuntimeConfig,
}

impl VenueRuntime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Run a future to completion on a fresh timer-enabled runtime
    pub fn block_on<F>(&self, future: F) -> std::io::Result<F::Output>
    where
        F: Future,
    {
        info!("▶️  Starting runtime {}", self.config.thread_name);
        let mut runtime = RuntimeBuilder::<FusionDriver>::new()
            .with_entries(self.config.entries)
            .enable_timer()
            .build()?;
        let output = runtime.block_on(future);
        info!("⏹️  Runtime {} stopped", self.config.thread_name);
        Ok(output)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl Default for VenueRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_runtime_config() {
        let runtime = VenueRuntime::with_config(RuntimeConfig {
            thread_name: "test-runtime".to_string(),
            entries: 64,
        });
        assert_eq!(runtime.config().thread_name, "test-runtime");
        assert_eq!(runtime.config().entries, 64);
    }

    #[test]
    fn test_block_on_has_timer() {
        let runtime = VenueRuntime::new();
        let value = runtime
            .block_on(async {
                monoio::time::sleep(Duration::from_millis(1)).await;
                7
            })
            .unwrap();
        assert_eq!(value, 7);
    }
}
