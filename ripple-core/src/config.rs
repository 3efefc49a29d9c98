//! Runtime Configuration
//!
//! Limits and switches for the per-thread runtime. The defaults are what most
//! programs want; tests and embedders that need tighter loop detection can
//! load a config from JSON and install it with [`configure`].
//!
//! ```rust
//! use ripple_core::{configure, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_json(r#"{ "max_flush_iterations": 5000 }"#).unwrap();
//! configure(config);
//! ```

use serde::{Deserialize, Serialize};

use crate::reactive::Runtime;

/// Tunables for the reactive runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of computations a single flush may execute before it is
    /// aborted with [`ReactiveError::InfiniteLoop`](crate::ReactiveError::InfiniteLoop).
    pub max_flush_iterations: usize,

    /// Maximum recursion depth while marking downstream observers.
    pub max_mark_depth: usize,

    /// Log a warning when a computation or cleanup is created with no owner.
    pub warn_unowned: bool,

    /// How many computation errors are kept for [`take_errors`](crate::take_errors).
    /// Older entries are dropped first.
    pub error_log_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_iterations: 1_000_000,
            max_mark_depth: 100_000,
            warn_unowned: true,
            error_log_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from a JSON string. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Install `config` on this thread's runtime.
pub fn configure(config: RuntimeConfig) {
    Runtime::with(|runtime| runtime.set_config(config));
}

/// The config currently installed on this thread's runtime.
pub fn current_config() -> RuntimeConfig {
    Runtime::with(|runtime| runtime.config())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_config() {
        let config = RuntimeConfig::from_json(r#"{ "max_flush_iterations": 42 }"#).unwrap();
        assert_eq!(config.max_flush_iterations, 42);
        assert_eq!(config.max_mark_depth, RuntimeConfig::default().max_mark_depth);
        assert!(config.warn_unowned);
    }

    #[test]
    fn parse_rejects_wrong_types() {
        assert!(RuntimeConfig::from_json(r#"{ "warn_unowned": "yes" }"#).is_err());
    }

    #[test]
    fn configure_is_per_thread() {
        configure(RuntimeConfig {
            error_log_capacity: 3,
            ..RuntimeConfig::default()
        });
        assert_eq!(current_config().error_log_capacity, 3);

        let other = std::thread::spawn(|| current_config().error_log_capacity)
            .join()
            .unwrap();
        assert_eq!(other, RuntimeConfig::default().error_log_capacity);
        configure(RuntimeConfig::default());
    }
}
