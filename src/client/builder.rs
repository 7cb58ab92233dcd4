// ABOUTME: Builder for state machines collecting configuration path, timeouts and engine debug settings
// ABOUTME: Applies the options in order: engine debug log, configuration, then per-handle timing

use crate::client::error::{GammuError, GammuResult, NativeError};
use crate::client::state_machine::{DEFAULT_TIMEOUT, StateMachine};
use crate::engine::Driver;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Builder pattern for state machine configuration
///
/// ```rust
/// use gammu::client::StateMachineBuilder;
/// use gammu::engine::dummy::DummyDriver;
/// use std::time::Duration;
///
/// let driver = DummyDriver::new().with_config_file("/etc/gammurc");
/// let sm = StateMachineBuilder::new()
///     .config_path("/etc/gammurc")
///     .timeout(Duration::from_secs(30))
///     .build_with(driver)?;
///
/// assert_eq!(sm.timeout(), Duration::from_secs(30));
/// # Ok::<(), gammu::client::GammuError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StateMachineBuilder {
    /// Configuration file; `None` searches the default locations
    pub config_path: Option<PathBuf>,
    /// Confirmation timeout per physical message (default: 10 seconds)
    pub timeout: Duration,
    /// Pause between device pumps while waiting (default: none)
    pub poll_interval: Duration,
    /// Engine debug level and log file
    pub native_debug: Option<(String, PathBuf)>,
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            config_path: None,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::ZERO,
            native_debug: None,
        }
    }
}

impl StateMachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from `path` instead of the default locations
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Writes the engine's debug log at `level` (for libGammu e.g. `"textall"`) to `file`
    pub fn native_debug(mut self, level: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.native_debug = Some((level.into(), file.into()));
        self
    }

    /// Creates the state machine on `driver`
    pub fn build_with<D: Driver>(self, driver: D) -> GammuResult<StateMachine<D>> {
        if let Some((level, file)) = &self.native_debug {
            driver.set_debug(level, file).map_err(|code| {
                warn!("Engine debug log could not be enabled: {}", code);
                GammuError::Configuration(NativeError::new(code, driver.error_string(code)))
            })?;
        }

        let mut sm = StateMachine::create(driver, self.config_path.as_deref())?;
        sm.set_timeout(self.timeout);
        sm.set_poll_interval(self.poll_interval);
        Ok(sm)
    }

    /// Creates the state machine on libGammu
    #[cfg(feature = "native")]
    pub fn build(self) -> GammuResult<StateMachine<crate::engine::native::NativeDriver>> {
        self.build_with(crate::engine::native::NativeDriver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::ErrorCode;
    use crate::engine::dummy::DummyDriver;
    use std::path::Path;

    #[test]
    fn test_builder_defaults() {
        let builder = StateMachineBuilder::default();
        assert!(builder.config_path.is_none());
        assert_eq!(builder.timeout, Duration::from_secs(10));
        assert_eq!(builder.poll_interval, Duration::ZERO);
        assert!(builder.native_debug.is_none());
    }

    #[test]
    fn test_builder_applies_settings() {
        let driver = DummyDriver::new().with_config_file("/tmp/gammurc");
        let sm = StateMachineBuilder::new()
            .config_path("/tmp/gammurc")
            .timeout(Duration::from_millis(250))
            .poll_interval(Duration::from_millis(5))
            .native_debug("textall", "/tmp/gammu.log")
            .build_with(driver.clone())
            .unwrap();

        assert_eq!(sm.timeout(), Duration::from_millis(250));
        assert_eq!(sm.poll_interval(), Duration::from_millis(5));
        assert_eq!(
            driver.debug_settings(),
            Some(("textall".to_string(), Path::new("/tmp/gammu.log").to_path_buf()))
        );
    }

    #[test]
    fn test_builder_missing_config() {
        let driver = DummyDriver::new();
        let err = StateMachineBuilder::new()
            .config_path("/nonexistent/path.ini")
            .build_with(driver.clone())
            .unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::CantOpenFile));
        assert_eq!(driver.allocations(), 0);
    }
}
