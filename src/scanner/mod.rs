//! Scan orchestration and report types

pub mod engine;

use crate::net::ProbeResult;
use crate::vuln::{self, Severity};
use serde::{Deserialize, Serialize};

pub use engine::ScanEngine;

/// Per-severity tally of findings across all open ports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeveritySummary {
    /// Tally the findings attached to a set of probe results.
    pub fn tally(open_ports: &[ProbeResult]) -> Self {
        let mut summary = Self::default();

        for vuln in open_ports.iter().flat_map(|p| &p.vulnerabilities) {
            match vuln.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => {}
            }
        }

        summary
    }

    pub fn is_clean(&self) -> bool {
        self.critical == 0 && self.high == 0 && self.medium == 0 && self.low == 0
    }
}

/// Complete result of one scan invocation.
///
/// Immutable once constructed; only confirmed-open ports appear in
/// `open_ports`, sorted ascending by port number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Target as given by the caller
    pub host: String,

    /// Address the target resolved to
    pub ip: String,

    /// Open ports with their enrichments, ascending by port number
    pub open_ports: Vec<ProbeResult>,

    /// Size of the swept range or curated list
    pub total_ports_scanned: usize,

    /// Wall-clock duration of the whole scan in milliseconds
    pub scan_time_ms: f64,

    /// Weighted severity score over all findings, capped at 100
    pub risk_score: u32,

    pub summary: SeveritySummary,
}

impl ScanReport {
    /// Assemble a report from raw open-port results: sort, tally, score.
    pub fn assemble(
        host: String,
        ip: String,
        mut open_ports: Vec<ProbeResult>,
        total_ports_scanned: usize,
        scan_time_ms: f64,
    ) -> Self {
        open_ports.sort_by_key(|r| r.port);

        let all_vulns: Vec<_> = open_ports
            .iter()
            .flat_map(|p| p.vulnerabilities.iter().cloned())
            .collect();

        let summary = SeveritySummary::tally(&open_ports);
        let risk_score = vuln::risk_score(&all_vulns);

        Self {
            host,
            ip,
            open_ports,
            total_ports_scanned,
            scan_time_ms,
            risk_score,
            summary,
        }
    }
}
