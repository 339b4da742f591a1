//! Stability assessment for open ports
//!
//! An open port is only interesting if it stays open. Ephemeral ports (the
//! local end of an outbound connection, a short-lived child process) accept
//! one connect and are gone on the next; re-probing separates them from
//! standing services.

use crate::config::ScanOptions;
use crate::net::{PortProber, PortState, Stability};
use std::net::IpAddr;
use std::time::Duration;

/// Re-probes an already-open port a fixed number of rounds.
///
/// Policy: any round that fails to observe OPEN makes the port EPHEMERAL;
/// only a clean sweep earns STABLE. Each round is an independent probe with
/// its own socket and timeout.
#[derive(Debug, Clone)]
pub struct StabilityAssessor {
    retries: u32,
    delay: Duration,
}

impl StabilityAssessor {
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            retries: options.stability_retries,
            delay: options.stability_delay_duration(),
        }
    }

    /// Classify an open port as STABLE or EPHEMERAL.
    ///
    /// Only meaningful for ports already confirmed OPEN by an initial probe.
    pub async fn assess(&self, prober: &PortProber, addr: IpAddr, port: u16) -> Stability {
        for round in 0..self.retries {
            tokio::time::sleep(self.delay).await;

            let result = prober.probe(addr, port).await;
            if result.state != PortState::Open {
                log::debug!(
                    "port {} lost on stability round {}/{}: {}",
                    port,
                    round + 1,
                    self.retries,
                    result.state
                );
                return Stability::Ephemeral;
            }
        }

        Stability::Stable
    }
}
