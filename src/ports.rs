//! Static reference data for well-known ports
//!
//! Pure lookup tables, no state: the port-to-service map used to label a
//! probe before any payload arrives, the curated quick-scan list, and the
//! special port sets the fingerprinter dispatches on.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse service category for a well-known port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortCategory {
    Web,
    Remote,
    Database,
    Messaging,
    Email,
    Network,
    Container,
    WebFramework,
    Monitoring,
    Unknown,
}

impl PortCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortCategory::Web => "web",
            PortCategory::Remote => "remote",
            PortCategory::Database => "database",
            PortCategory::Messaging => "messaging",
            PortCategory::Email => "email",
            PortCategory::Network => "network",
            PortCategory::Container => "container",
            PortCategory::WebFramework => "web-framework",
            PortCategory::Monitoring => "monitoring",
            PortCategory::Unknown => "unknown",
        }
    }
}

/// Reference entry for a port: default service label and category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub service: String,
    pub category: PortCategory,
    pub description: Option<String>,
}

impl PortInfo {
    fn known(service: &str, category: PortCategory, description: &str) -> Self {
        Self {
            service: service.to_string(),
            category,
            description: Some(description.to_string()),
        }
    }

    fn unknown() -> Self {
        Self {
            service: "Unknown".to_string(),
            category: PortCategory::Unknown,
            description: Some("Unregistered or custom service".to_string()),
        }
    }
}

/// Well-known port reference table
static WELL_KNOWN_PORTS: Lazy<HashMap<u16, PortInfo>> = Lazy::new(|| {
    use PortCategory::*;

    let mut m = HashMap::new();

    // Web
    m.insert(80, PortInfo::known("HTTP", Web, "Hypertext Transfer Protocol"));
    m.insert(443, PortInfo::known("HTTPS", Web, "HTTP over TLS/SSL"));
    m.insert(8080, PortInfo::known("HTTP-Alt", Web, "HTTP Alternate (Tomcat/Jenkins common)"));
    m.insert(8443, PortInfo::known("HTTPS-Alt", Web, "HTTPS Alternate"));
    m.insert(8000, PortInfo::known("HTTP-Alt", Web, "HTTP Alternate (Python/Django common)"));
    m.insert(8888, PortInfo::known("HTTP-Alt", Web, "HTTP Alternate (Jupyter)"));

    // Remote access
    m.insert(22, PortInfo::known("SSH", Remote, "Secure Shell"));
    m.insert(23, PortInfo::known("Telnet", Remote, "Telnet (INSECURE)"));
    m.insert(3389, PortInfo::known("RDP", Remote, "Remote Desktop Protocol"));
    m.insert(5900, PortInfo::known("VNC", Remote, "Virtual Network Computing"));
    m.insert(5901, PortInfo::known("VNC", Remote, "VNC Display 1"));

    // Databases
    m.insert(3306, PortInfo::known("MySQL", Database, "MySQL Database"));
    m.insert(5432, PortInfo::known("PostgreSQL", Database, "PostgreSQL Database"));
    m.insert(27017, PortInfo::known("MongoDB", Database, "MongoDB Database"));
    m.insert(6379, PortInfo::known("Redis", Database, "Redis Key-Value Store"));
    m.insert(9042, PortInfo::known("Cassandra", Database, "Apache Cassandra"));
    m.insert(1433, PortInfo::known("MSSQL", Database, "Microsoft SQL Server"));
    m.insert(5984, PortInfo::known("CouchDB", Database, "Apache CouchDB"));
    m.insert(7474, PortInfo::known("Neo4j", Database, "Neo4j Graph Database"));

    // Messaging
    m.insert(5672, PortInfo::known("RabbitMQ", Messaging, "RabbitMQ AMQP"));
    m.insert(15672, PortInfo::known("RabbitMQ-Mgmt", Messaging, "RabbitMQ Management"));
    m.insert(9092, PortInfo::known("Kafka", Messaging, "Apache Kafka"));
    m.insert(4222, PortInfo::known("NATS", Messaging, "NATS Messaging"));

    // Dev servers / frameworks
    m.insert(3000, PortInfo::known("Web Framework", WebFramework, "Node.js/React/Grafana (common dev port)"));
    m.insert(3001, PortInfo::known("Web Framework", WebFramework, "Alternate dev server"));
    m.insert(4200, PortInfo::known("Angular", WebFramework, "Angular CLI Dev Server"));
    m.insert(5000, PortInfo::known("Web Framework", WebFramework, "Flask/Docker Registry (multi-purpose)"));
    m.insert(9000, PortInfo::known("PHP-FPM", WebFramework, "PHP FastCGI"));

    // Mail
    m.insert(25, PortInfo::known("SMTP", Email, "Simple Mail Transfer Protocol"));
    m.insert(587, PortInfo::known("SMTP-Submit", Email, "SMTP Submission"));
    m.insert(465, PortInfo::known("SMTPS", Email, "SMTP over SSL"));
    m.insert(143, PortInfo::known("IMAP", Email, "Internet Message Access Protocol"));
    m.insert(993, PortInfo::known("IMAPS", Email, "IMAP over SSL"));
    m.insert(110, PortInfo::known("POP3", Email, "Post Office Protocol v3"));
    m.insert(995, PortInfo::known("POP3S", Email, "POP3 over SSL"));

    // Network services
    m.insert(53, PortInfo::known("DNS", Network, "Domain Name System"));
    m.insert(67, PortInfo::known("DHCP", Network, "Dynamic Host Configuration"));
    m.insert(68, PortInfo::known("DHCP-Client", Network, "DHCP Client"));
    m.insert(161, PortInfo::known("SNMP", Network, "Simple Network Management"));

    // Container / orchestration
    m.insert(2375, PortInfo::known("Docker", Container, "Docker API (Insecure)"));
    m.insert(2376, PortInfo::known("Docker-TLS", Container, "Docker API over TLS"));
    m.insert(6443, PortInfo::known("Kubernetes", Container, "Kubernetes API Server"));
    m.insert(10250, PortInfo::known("Kubelet", Container, "Kubelet API"));
    m.insert(2379, PortInfo::known("etcd", Container, "etcd Client API"));

    // Monitoring
    m.insert(9090, PortInfo::known("Prometheus", Monitoring, "Prometheus Metrics"));
    m.insert(9200, PortInfo::known("Elasticsearch", Monitoring, "Elasticsearch HTTP"));
    m.insert(9300, PortInfo::known("Elasticsearch-Transport", Monitoring, "Elasticsearch Transport"));
    m.insert(5601, PortInfo::known("Kibana", Monitoring, "Kibana Dashboard"));

    m
});

/// Curated port list used by quick scans
pub static COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 135, 139, 143, 443, 445, 993, 995, 1433, 3306, 3389, 5432, 5900,
    6379, 8080, 8443, 27017,
];

/// Ports the fingerprinter treats as HTTP even without a banner
pub static HTTP_PORTS: &[u16] = &[80, 443, 8080, 8443, 8000];

/// Redis wire protocol port
pub const REDIS_PORT: u16 = 6379;

/// Look up the reference entry for a port.
///
/// Total: ports outside the table get an "Unknown" entry rather than None.
pub fn port_info(port: u16) -> PortInfo {
    WELL_KNOWN_PORTS
        .get(&port)
        .cloned()
        .unwrap_or_else(PortInfo::unknown)
}

/// Refine the default port label using banner content.
///
/// Multi-purpose dev ports (3000, 8080, 5000) host very different stacks;
/// a framework signature in the banner upgrades the generic guess. Returns
/// None when the banner adds nothing.
pub fn refine_from_banner(port: u16, banner: &str) -> Option<PortInfo> {
    let lower = banner.to_lowercase();

    match port {
        3000 => {
            if lower.contains("grafana") {
                return Some(PortInfo::known("Grafana", PortCategory::Monitoring, "Grafana Dashboard"));
            }
            if lower.contains("node") || lower.contains("express") {
                return Some(PortInfo::known("Node.js", PortCategory::WebFramework, "Node.js application"));
            }
        }
        8080 => {
            if lower.contains("tomcat") {
                return Some(PortInfo::known("Tomcat", PortCategory::Web, "Apache Tomcat"));
            }
            if lower.contains("jenkins") {
                return Some(PortInfo::known("Jenkins", PortCategory::WebFramework, "Jenkins CI/CD"));
            }
        }
        5000 => {
            if lower.contains("flask") || lower.contains("werkzeug") {
                return Some(PortInfo::known("Flask", PortCategory::WebFramework, "Flask application"));
            }
            if lower.contains("docker") || lower.contains("registry") {
                return Some(PortInfo::known("Docker Registry", PortCategory::Container, "Docker Registry API"));
            }
        }
        _ => {}
    }

    None
}
