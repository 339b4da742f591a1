//! Service fingerprinting for open ports
//!
//! A secondary, opportunistic enrichment step: given an open port and
//! possibly a banner the prober already captured, decide what is actually
//! listening there. Dispatch order: an existing banner is matched without
//! further I/O; well-known HTTP ports get an active HTTP probe; the Redis
//! port gets a PING/INFO handshake; everything else gets a passive grab.

pub mod banner;
pub mod http;
pub mod patterns;
pub mod redis;

use crate::ports::{HTTP_PORTS, REDIS_PORT};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Default timeout for fingerprinting network I/O, independent of the
/// scan's connect timeout
pub const FINGERPRINT_TIMEOUT: Duration = Duration::from_secs(2);

/// Inferred identity of the service behind an open port.
///
/// Always a valid terminal value: `identified: false` means the probes ran
/// and came up empty, not that something failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFingerprint {
    pub identified: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,

    pub confidence: f32,
}

impl ServiceFingerprint {
    /// Terminal "nothing found" value
    pub fn unidentified() -> Self {
        Self {
            identified: false,
            service: None,
            version: None,
            banner: None,
            confidence: 0.0,
        }
    }

    /// Unidentified, but with raw payload preserved for display
    pub fn unidentified_with_banner(banner: String) -> Self {
        Self {
            banner: Some(banner),
            ..Self::unidentified()
        }
    }
}

impl Default for ServiceFingerprint {
    fn default() -> Self {
        Self::unidentified()
    }
}

/// Runs protocol-specific probes and banner matching against open ports.
///
/// Never fails the caller: every internal error degrades to an
/// unidentified fingerprint.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    timeout: Duration,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self {
            timeout: FINGERPRINT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fingerprint the service on (addr, port).
    ///
    /// A banner already captured by the prober short-circuits all network
    /// I/O; otherwise the port number selects the probe strategy.
    pub async fn fingerprint(
        &self,
        addr: IpAddr,
        port: u16,
        banner: Option<&str>,
    ) -> ServiceFingerprint {
        if let Some(banner) = banner {
            return patterns::match_banner(banner, port);
        }

        if HTTP_PORTS.contains(&port) {
            return http::probe_http(addr, port, self.timeout).await;
        }

        if port == REDIS_PORT {
            return redis::probe_redis(addr, port, self.timeout).await;
        }

        banner::grab_banner(addr, port, self.timeout).await
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_existing_banner_short_circuits_io() {
        // Port 80 is an HTTP-probe port, but a captured banner must win
        // without touching the network; an unroutable address proves it
        let fingerprinter = Fingerprinter::new().with_timeout(Duration::from_millis(100));
        let fp = fingerprinter
            .fingerprint(
                "192.0.2.1".parse().unwrap(),
                80,
                Some("SSH-2.0-OpenSSH_9.6"),
            )
            .await;

        assert!(fp.identified);
        assert_eq!(fp.service.as_deref(), Some("SSH"));
    }

    #[tokio::test]
    async fn test_unreachable_target_degrades_to_unidentified() {
        let fingerprinter = Fingerprinter::new().with_timeout(Duration::from_millis(100));
        let fp = fingerprinter
            .fingerprint("192.0.2.1".parse().unwrap(), 12345, None)
            .await;

        assert!(!fp.identified);
        assert_eq!(fp.confidence, 0.0);
    }
}
