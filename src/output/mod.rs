//! Report rendering
//!
//! The engine hands over an immutable `ScanReport`; everything here is
//! presentation. Two formats: a human-readable text layout and pretty JSON.

use crate::scanner::ScanReport;
use crate::vuln::Severity;
use colored::Colorize;
use std::fs::File;
use std::io::{self, Write};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<String>,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
        }
    }
}

/// Renders scan reports to stdout or a file
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Write a report in the configured format.
    pub fn write_report(&self, report: &ScanReport) -> crate::Result<()> {
        let output = match self.config.format {
            OutputFormat::Text => self.format_text(report),
            OutputFormat::Json => self.format_json(report)?,
        };

        match &self.config.file {
            Some(filename) => {
                let mut file = File::create(filename)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                let mut stdout = io::stdout();
                stdout.write_all(output.as_bytes())?;
            }
        }

        Ok(())
    }

    fn format_json(&self, report: &ScanReport) -> crate::Result<String> {
        serde_json::to_string_pretty(report)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| crate::ScanError::OutputError(e.to_string()))
    }

    fn format_text(&self, report: &ScanReport) -> String {
        let mut out = String::new();
        let rule = "=".repeat(70);
        let thin_rule = "-".repeat(70);

        out.push_str(&format!("\n{}\n", rule));
        out.push_str(&format!("{}\n", self.paint_bold("PORT SCAN RESULTS")));
        out.push_str(&format!("{}\n", rule));
        out.push_str(&format!("Host: {} ({})\n", report.host, report.ip));
        out.push_str(&format!(
            "Scanned at: {}\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!("Scan Time: {:.2}s\n", report.scan_time_ms / 1000.0));
        out.push_str(&format!("Ports Scanned: {}\n", report.total_ports_scanned));
        out.push_str(&format!("Open Ports: {}\n", report.open_ports.len()));
        out.push_str(&format!("Risk Score: {}/100\n", report.risk_score));

        out.push_str(&format!(
            "\nVulnerabilities: Critical: {}, High: {}, Medium: {}, Low: {}\n",
            report.summary.critical, report.summary.high, report.summary.medium, report.summary.low
        ));

        if report.open_ports.is_empty() {
            out.push_str("\nNo open ports found.\n");
            out.push_str(&format!("{}\n", rule));
            return out;
        }

        out.push_str(&format!("\n{}\n", thin_rule));
        out.push_str(&format!("{}\n", self.paint_bold("OPEN PORTS")));
        out.push_str(&format!("{}\n\n", thin_rule));

        for port in &report.open_ports {
            let heading = format!(
                "Port {} - {} ({})",
                port.port,
                port.info.service,
                port.info.category.as_str()
            );
            out.push_str(&format!("{}\n", self.paint_open(&heading)));
            out.push_str(&format!("  State: {}\n", port.state));
            out.push_str(&format!("  Response Time: {:.3}ms\n", port.response_time_ms));

            if let Some(behavior) = port.behavior {
                out.push_str(&format!("  Behavior: {}\n", behavior));
            }

            if let Some(ref inference) = port.inference {
                out.push_str(&format!("  Inference: {}\n", inference));
            }

            if let Some(stability) = port.stability {
                out.push_str(&format!("  Stability: {}\n", stability));
            }

            if let Some(ref fp) = port.fingerprint {
                if fp.identified {
                    if let Some(ref service) = fp.service {
                        out.push_str(&format!("  Service: {}\n", service));
                    }
                    if let Some(ref version) = fp.version {
                        out.push_str(&format!("  Version: {}\n", version));
                    }
                }
            }

            if !port.vulnerabilities.is_empty() {
                out.push_str("  Vulnerabilities:\n");
                for vuln in &port.vulnerabilities {
                    let tag = format!("[{}]", vuln.severity);
                    out.push_str(&format!(
                        "    {} {}\n",
                        self.paint_severity(&tag, vuln.severity),
                        vuln.title
                    ));
                    out.push_str(&format!("      {}\n", vuln.description));
                    out.push_str(&format!("      -> {}\n", vuln.recommendation));
                }
            }

            out.push('\n');
        }

        out.push_str(&format!("{}\n", rule));
        out
    }

    fn paint_bold(&self, s: &str) -> String {
        if self.config.colored {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_open(&self, s: &str) -> String {
        if self.config.colored {
            s.bright_green().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_severity(&self, s: &str, severity: Severity) -> String {
        if !self.config.colored {
            return s.to_string();
        }

        match severity {
            Severity::Critical => s.bright_red().bold().to_string(),
            Severity::High => s.bright_red().to_string(),
            Severity::Medium => s.bright_yellow().to_string(),
            Severity::Low => s.bright_blue().to_string(),
            Severity::Info => s.bright_black().to_string(),
        }
    }
}
