//! Error handling for the deimos engine
//!
//! Only two conditions are allowed to abort a scan: the target failing to
//! resolve and invalid scan options. Everything that can go wrong at the
//! level of a single port (refused, timed out, unreachable, reset) is folded
//! into the `ProbeResult` for that port instead of being raised, so one dead
//! port can never sink a sweep of 65535 others.

use thiserror::Error;

/// Main error type for scan operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to resolve target '{0}'")]
    ResolveError(String),

    #[error("Invalid port range: {0}")]
    PortRangeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl From<std::net::AddrParseError> for ScanError {
    fn from(e: std::net::AddrParseError) -> Self {
        ScanError::InvalidTarget(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::ResolveError("nosuchhost.invalid".to_string());
        assert!(err.to_string().contains("nosuchhost.invalid"));

        let err = ScanError::PortRangeError("start 500 > end 80".to_string());
        assert!(err.to_string().starts_with("Invalid port range"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: ScanError = io.into();
        assert!(matches!(err, ScanError::IoError(_)));
    }
}
