//! Probe-level types and host resolution

pub mod prober;
pub mod stability;

use crate::fingerprint::ServiceFingerprint;
use crate::ports::PortInfo;
use crate::vuln::Vulnerability;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub use prober::PortProber;
pub use stability::StabilityAssessor;

/// Connection state observed for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => write!(f, "OPEN"),
            PortState::Closed => write!(f, "CLOSED"),
            PortState::Filtered => write!(f, "FILTERED"),
        }
    }
}

/// Connection behavior observed after the socket outcome was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortBehavior {
    /// Accepted the connection and sat silent through the idle window
    Idle,
    /// Accepted the connection and closed it before sending anything
    ImmediateClose,
    /// Sent unsolicited data right after accepting
    SentData,
    /// Never completed the handshake within the connect timeout
    Timeout,
}

impl std::fmt::Display for PortBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortBehavior::Idle => write!(f, "idle"),
            PortBehavior::ImmediateClose => write!(f, "immediate_close"),
            PortBehavior::SentData => write!(f, "sent_data"),
            PortBehavior::Timeout => write!(f, "timeout"),
        }
    }
}

/// Whether an open port survives repeated probing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stability {
    Stable,
    Ephemeral,
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stability::Stable => write!(f, "STABLE"),
            Stability::Ephemeral => write!(f, "EPHEMERAL"),
        }
    }
}

/// Classified outcome of one probe against one (address, port) pair.
///
/// Created by the prober; the stability, fingerprint and vulnerability
/// fields are filled in by the later pipeline stages, and only ever for
/// ports confirmed OPEN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub port: u16,

    pub state: PortState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<PortBehavior>,

    /// Human-readable reading of the socket-level evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference: Option<String>,

    /// Default service label from reference data, possibly banner-refined
    pub info: PortInfo,

    /// Milliseconds from connect attempt to the first state-defining event
    pub response_time_ms: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<Stability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<ServiceFingerprint>,

    pub vulnerabilities: Vec<Vulnerability>,
}

impl ProbeResult {
    pub fn new(port: u16, info: PortInfo) -> Self {
        Self {
            port,
            state: PortState::Filtered,
            behavior: None,
            inference: None,
            info,
            response_time_ms: 0.0,
            stability: None,
            fingerprint: None,
            vulnerabilities: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }

    /// Banner captured by the prober, if the service volunteered one
    pub fn banner(&self) -> Option<&str> {
        self.fingerprint.as_ref().and_then(|fp| fp.banner.as_deref())
    }
}

/// Resolve a hostname or literal address to an IP.
///
/// Failure here is fatal to the whole scan; there is no partial result to
/// salvage without an address.
pub async fn resolve(host: &str) -> crate::Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs: Vec<_> = tokio::net::lookup_host((host, 0u16))
        .await
        .map_err(|_| crate::ScanError::ResolveError(host.to_string()))?
        .collect();

    addrs
        .iter()
        .find(|sa| sa.is_ipv4())
        .or_else(|| addrs.first())
        .map(|sa| sa.ip())
        .ok_or_else(|| crate::ScanError::ResolveError(host.to_string()))
}
