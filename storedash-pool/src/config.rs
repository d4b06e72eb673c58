//! Pool configuration.

use std::time::Duration;

/// Default idle window before a tenant connection is closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Configuration for the tenant connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Time without a successful acquisition before a live connection is
    /// closed and its entry removed.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl PoolConfig {
    /// Create a new config builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// Builder for pool configuration.
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    idle_timeout: Option<Duration>,
}

impl PoolConfigBuilder {
    /// Set the idle timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Build the config.
    pub fn build(self) -> PoolConfig {
        PoolConfig {
            idle_timeout: self.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_config_builder() {
        let config = PoolConfig::builder()
            .idle_timeout(Duration::from_secs(600))
            .build();
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }
}
