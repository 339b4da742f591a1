//! Configuration module for the deimos engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Inclusive port range to sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Number of ports covered by the range
    pub fn len(&self) -> usize {
        (self.end as usize) - (self.start as usize) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self { start: 1, end: 65535 }
    }
}

/// Options governing a single scan invocation.
///
/// Immutable once handed to the engine; defaults mirror what an interactive
/// audit of a single host wants (1s connects, 200 sockets in flight).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Timeout for each connection attempt in milliseconds
    pub connect_timeout: u64,

    /// Grace period after connect during which the prober waits for
    /// unsolicited data, in milliseconds
    pub idle_observe: u64,

    /// Maximum number of probes in flight at any instant
    pub max_concurrency: usize,

    /// Number of re-probe rounds used to confirm an open port is stable
    pub stability_retries: u32,

    /// Delay between stability re-probe rounds in milliseconds
    pub stability_delay: u64,

    /// Run service fingerprinting against open ports
    pub fingerprinting: bool,

    /// Run vulnerability rules against enriched open ports
    pub vuln_checks: bool,

    /// Port range for full/range scans
    pub port_range: PortRange,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            connect_timeout: 1000,
            idle_observe: 300,
            max_concurrency: 200,
            stability_retries: 3,
            stability_delay: 400,
            fingerprinting: true,
            vuln_checks: true,
            port_range: PortRange::default(),
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout in milliseconds
    pub fn with_connect_timeout(mut self, ms: u64) -> Self {
        self.connect_timeout = ms;
        self
    }

    /// Set the idle-observation window in milliseconds
    pub fn with_idle_observe(mut self, ms: u64) -> Self {
        self.idle_observe = ms;
        self
    }

    /// Set the maximum number of in-flight probes
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    /// Set the stability re-probe count
    pub fn with_stability_retries(mut self, n: u32) -> Self {
        self.stability_retries = n;
        self
    }

    /// Set the delay between stability rounds in milliseconds
    pub fn with_stability_delay(mut self, ms: u64) -> Self {
        self.stability_delay = ms;
        self
    }

    /// Enable or disable service fingerprinting
    pub fn with_fingerprinting(mut self, enabled: bool) -> Self {
        self.fingerprinting = enabled;
        self
    }

    /// Enable or disable vulnerability checks
    pub fn with_vuln_checks(mut self, enabled: bool) -> Self {
        self.vuln_checks = enabled;
        self
    }

    /// Set the port range
    pub fn with_port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range = PortRange::new(start, end);
        self
    }

    /// Get the connect timeout as a Duration
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    /// Get the idle-observation window as a Duration
    pub fn idle_observe_duration(&self) -> Duration {
        Duration::from_millis(self.idle_observe)
    }

    /// Get the stability inter-round delay as a Duration
    pub fn stability_delay_duration(&self) -> Duration {
        Duration::from_millis(self.stability_delay)
    }

    /// Load options from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let options: ScanOptions = toml::from_str(&content)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        Ok(options)
    }

    /// Load options from `~/.deimos.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".deimos.toml");

        if config_path.exists() {
            if let Ok(options) = Self::from_toml_file(&config_path) {
                log::info!("Loaded config from {}", config_path.display());
                return options;
            }
        }

        Self::default()
    }

    /// Validate the options
    pub fn validate(&self) -> crate::Result<()> {
        if self.port_range.start == 0 {
            return Err(crate::ScanError::PortRangeError(
                "Port range must start at 1 or above".to_string(),
            ));
        }

        if self.port_range.start > self.port_range.end {
            return Err(crate::ScanError::PortRangeError(format!(
                "start {} > end {}",
                self.port_range.start, self.port_range.end
            )));
        }

        if self.max_concurrency == 0 {
            return Err(crate::ScanError::ConfigError(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout == 0 {
            return Err(crate::ScanError::ConfigError(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.connect_timeout, 1000);
        assert_eq!(options.idle_observe, 300);
        assert_eq!(options.max_concurrency, 200);
        assert_eq!(options.stability_retries, 3);
        assert_eq!(options.stability_delay, 400);
        assert!(options.fingerprinting);
        assert!(options.vuln_checks);
        assert_eq!(options.port_range, PortRange::new(1, 65535));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = ScanOptions::new()
            .with_connect_timeout(250)
            .with_max_concurrency(64)
            .with_port_range(1, 1024)
            .with_fingerprinting(false);

        assert_eq!(options.connect_timeout, 250);
        assert_eq!(options.max_concurrency, 64);
        assert_eq!(options.port_range.len(), 1024);
        assert!(!options.fingerprinting);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let options = ScanOptions::new().with_port_range(500, 80);
        assert!(matches!(
            options.validate(),
            Err(crate::ScanError::PortRangeError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let options = ScanOptions::new().with_port_range(0, 80);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let options = ScanOptions::new().with_max_concurrency(0);
        assert!(matches!(
            options.validate(),
            Err(crate::ScanError::ConfigError(_))
        ));
    }
}
