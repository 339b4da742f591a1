//! Rule engine mapping probe evidence to findings
//!
//! Pure and total: `analyze` takes whatever combination of fields the
//! pipeline managed to populate and always returns a list, possibly empty.
//! No I/O, no state.

use crate::net::{ProbeResult, Stability};
use crate::vuln::{Severity, Vulnerability};

/// Stateless vulnerability analyzer consulted once per confirmed-open port.
#[derive(Debug, Clone, Default)]
pub struct VulnAnalyzer;

impl VulnAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every rule against an enriched probe result.
    pub fn analyze(&self, result: &ProbeResult) -> Vec<Vulnerability> {
        let mut findings = Vec::new();

        self.check_cleartext_protocols(result, &mut findings);
        self.check_exposed_datastores(result, &mut findings);
        self.check_control_planes(result, &mut findings);
        self.check_remote_desktop(result, &mut findings);
        self.check_legacy_ssh(result, &mut findings);
        self.check_version_disclosure(result, &mut findings);
        self.check_ephemeral(result, &mut findings);

        findings
    }

    fn check_cleartext_protocols(&self, result: &ProbeResult, findings: &mut Vec<Vulnerability>) {
        match result.port {
            23 => findings.push(Vulnerability::new(
                Severity::High,
                "Telnet service exposed",
                "Telnet transmits credentials and session data in cleartext",
                "Disable Telnet and use SSH for remote administration",
            )),
            21 => findings.push(Vulnerability::new(
                Severity::Medium,
                "FTP service exposed",
                "FTP transmits credentials in cleartext unless explicitly secured",
                "Replace with SFTP/FTPS or restrict to trusted networks",
            )),
            80 | 8000 | 8080 => findings.push(Vulnerability::new(
                Severity::Low,
                "Unencrypted HTTP endpoint",
                "Traffic to this port is not protected by TLS",
                "Serve over HTTPS and redirect plain-HTTP clients",
            )),
            _ => {}
        }
    }

    fn check_exposed_datastores(&self, result: &ProbeResult, findings: &mut Vec<Vulnerability>) {
        let is_redis_confirmed = result
            .fingerprint
            .as_ref()
            .map(|fp| fp.identified && fp.service.as_deref() == Some("Redis"))
            .unwrap_or(false);

        if is_redis_confirmed {
            // The handshake got a PONG without authenticating
            findings.push(Vulnerability::new(
                Severity::Critical,
                "Redis reachable without authentication",
                "The server answered PING and INFO from an unauthenticated connection",
                "Enable requirepass/ACLs and bind Redis to a private interface",
            ));
            return;
        }

        if matches!(result.port, 1433 | 3306 | 5432 | 6379 | 9042 | 5984 | 7474 | 27017) {
            findings.push(Vulnerability::new(
                Severity::Medium,
                "Database port exposed",
                "A database service is reachable from the scanning network",
                "Restrict access with firewall rules or a private network segment",
            ));
        }
    }

    fn check_control_planes(&self, result: &ProbeResult, findings: &mut Vec<Vulnerability>) {
        match result.port {
            2375 => findings.push(Vulnerability::new(
                Severity::Critical,
                "Unencrypted Docker API exposed",
                "The Docker daemon socket on 2375 grants root-equivalent control without TLS",
                "Disable the TCP socket or require TLS client certificates (2376)",
            )),
            6443 | 10250 | 2379 => findings.push(Vulnerability::new(
                Severity::High,
                "Cluster control-plane port exposed",
                "Kubernetes/etcd control endpoints should not face untrusted networks",
                "Restrict to the cluster network and enforce authentication",
            )),
            _ => {}
        }
    }

    fn check_remote_desktop(&self, result: &ProbeResult, findings: &mut Vec<Vulnerability>) {
        match result.port {
            3389 => findings.push(Vulnerability::new(
                Severity::Medium,
                "RDP exposed",
                "Remote Desktop is a frequent brute-force and exploit target",
                "Gate RDP behind a VPN or gateway with MFA",
            )),
            5900 | 5901 => findings.push(Vulnerability::new(
                Severity::Medium,
                "VNC exposed",
                "VNC often runs with weak or absent authentication",
                "Tunnel VNC over SSH or a VPN and require strong passwords",
            )),
            _ => {}
        }
    }

    fn check_legacy_ssh(&self, result: &ProbeResult, findings: &mut Vec<Vulnerability>) {
        if let Some(banner) = result.banner() {
            if banner.starts_with("SSH-1.") {
                findings.push(Vulnerability::new(
                    Severity::High,
                    "Legacy SSH protocol version 1",
                    "SSH protocol 1 has known cryptographic weaknesses",
                    "Upgrade the server and disable protocol 1 support",
                ));
            }
        }
    }

    fn check_version_disclosure(&self, result: &ProbeResult, findings: &mut Vec<Vulnerability>) {
        let discloses_version = result
            .fingerprint
            .as_ref()
            .map(|fp| fp.identified && fp.version.as_deref().map_or(false, |v| v != "Unknown"))
            .unwrap_or(false);

        if discloses_version {
            findings.push(Vulnerability::new(
                Severity::Info,
                "Service version disclosed",
                "The service advertises its exact version, easing exploit selection",
                "Suppress version strings in banners and headers where possible",
            ));
        }
    }

    fn check_ephemeral(&self, result: &ProbeResult, findings: &mut Vec<Vulnerability>) {
        if result.stability == Some(Stability::Ephemeral) {
            findings.push(Vulnerability::new(
                Severity::Info,
                "Transient listener",
                "The port did not stay open across re-probes; likely an outbound connection artifact",
                "No action needed unless the port reappears persistently",
            ));
        }
    }
}
