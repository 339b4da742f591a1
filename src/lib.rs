//! Deimos - a TCP reconnaissance engine
//!
//! Connect-scans a host, classifies per-port connection behavior from
//! socket-level signals, fingerprints the services behind open ports and
//! maps what it finds to known weaknesses.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod net;
pub mod output;
pub mod ports;
pub mod scanner;
pub mod vuln;

// Re-export commonly used types
pub use config::ScanOptions;
pub use error::ScanError;
pub use fingerprint::{Fingerprinter, ServiceFingerprint};
pub use net::{PortBehavior, PortState, ProbeResult, Stability};
pub use scanner::engine::ScanEngine;
pub use scanner::ScanReport;
pub use vuln::{Severity, Vulnerability};

pub type Result<T> = std::result::Result<T, ScanError>;
