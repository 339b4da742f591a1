//! Banner pattern families
//!
//! Ordered regex families per protocol; the first family with a match wins.
//! A pattern with a capture group yields the version token, a bare match on
//! a greeting-style protocol (FTP, SMTP) yields "Unknown" since presence
//! alone identifies the service.

use crate::fingerprint::ServiceFingerprint;
use crate::ports;
use once_cell::sync::Lazy;
use regex::Regex;

struct PatternFamily {
    service: &'static str,
    patterns: Vec<Regex>,
}

static FAMILIES: Lazy<Vec<PatternFamily>> = Lazy::new(|| {
    vec![
        PatternFamily {
            service: "SSH",
            patterns: vec![
                Regex::new(r"(?i)SSH-[\d.]+-OpenSSH_([\d.]+[^\s]*)").unwrap(),
                Regex::new(r"(?i)SSH-[\d.]+-(\S+)").unwrap(),
            ],
        },
        PatternFamily {
            service: "HTTP",
            patterns: vec![
                Regex::new(r"(?i)Server:\s*([^\r\n]+)").unwrap(),
                Regex::new(r"(?i)nginx/([\d.]+)").unwrap(),
                Regex::new(r"(?i)Apache/([\d.]+)").unwrap(),
            ],
        },
        PatternFamily {
            service: "FTP",
            patterns: vec![
                Regex::new(r"(?i)220\s+([^\r\n]+?)\s+FTP").unwrap(),
                Regex::new(r"(?i)220.*FTP").unwrap(),
            ],
        },
        PatternFamily {
            service: "SMTP",
            patterns: vec![
                Regex::new(r"(?i)220\s+([^\r\n]+?)\s+ESMTP").unwrap(),
                Regex::new(r"(?i)220.*SMTP").unwrap(),
            ],
        },
        PatternFamily {
            service: "MySQL",
            patterns: vec![
                Regex::new(r"([\d.]+)-MariaDB").unwrap(),
                Regex::new(r"(?i)mysql_native_password").unwrap(),
            ],
        },
        PatternFamily {
            service: "PostgreSQL",
            patterns: vec![Regex::new(r"(?i)PostgreSQL\s+([\d.]+)").unwrap()],
        },
    ]
});

/// Confidence levels assigned by the matcher
pub(crate) const CONFIDENCE_VERSIONED: f32 = 0.9;
pub(crate) const CONFIDENCE_PRESENCE: f32 = 0.7;
pub(crate) const CONFIDENCE_PORT_TABLE: f32 = 0.4;

/// Match a banner against the pattern families.
///
/// Falls back to the well-known-port table when no family matches, and
/// preserves the raw banner either way. Pure: identical input always yields
/// an identical fingerprint.
pub fn match_banner(banner: &str, port: u16) -> ServiceFingerprint {
    for family in FAMILIES.iter() {
        for pattern in &family.patterns {
            if let Some(caps) = pattern.captures(banner) {
                let version = caps.get(1).map(|m| m.as_str().to_string());
                let confidence = if version.is_some() {
                    CONFIDENCE_VERSIONED
                } else {
                    CONFIDENCE_PRESENCE
                };

                return ServiceFingerprint {
                    identified: true,
                    service: Some(family.service.to_string()),
                    version: Some(version.unwrap_or_else(|| "Unknown".to_string())),
                    banner: Some(banner.to_string()),
                    confidence,
                };
            }
        }
    }

    // No family matched: fall back to the reference table, version unknown
    let info = ports::port_info(port);
    if info.service != "Unknown" {
        return ServiceFingerprint {
            identified: true,
            service: Some(info.service),
            version: None,
            banner: Some(banner.to_string()),
            confidence: CONFIDENCE_PORT_TABLE,
        };
    }

    ServiceFingerprint {
        identified: false,
        service: None,
        version: None,
        banner: Some(banner.to_string()),
        confidence: 0.0,
    }
}
