//! Vulnerability model and risk scoring

pub mod analyzer;

use serde::{Deserialize, Serialize};

pub use analyzer::VulnAnalyzer;

/// Finding severity, ordered worst-first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Weight used by the risk-score reduction
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 25,
            Severity::High => 15,
            Severity::Medium => 8,
            Severity::Low => 3,
            Severity::Info => 0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// A single finding produced by the rule engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
}

impl Vulnerability {
    pub fn new(severity: Severity, title: &str, description: &str, recommendation: &str) -> Self {
        Self {
            severity,
            title: title.to_string(),
            description: description.to_string(),
            recommendation: recommendation.to_string(),
        }
    }
}

/// Weighted risk score over a set of findings, capped at 100.
pub fn risk_score(vulnerabilities: &[Vulnerability]) -> u32 {
    let score: u32 = vulnerabilities.iter().map(|v| v.severity.weight()).sum();
    score.min(100)
}
