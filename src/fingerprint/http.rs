//! Active HTTP probe
//!
//! Sends a minimal GET and reads until the header/body separator, then
//! pulls the server identity from the Server header or a recognized
//! engine/version token in the response head.

use crate::fingerprint::{patterns, ServiceFingerprint};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

static SERVER_ENGINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(nginx|apache|iis|openresty|caddy|litespeed)[/\s]?([\d.]+)?").unwrap()
});

static SERVER_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Server:\s*([^\r\n]+)").unwrap());

/// Probe (addr, port) as an HTTP endpoint.
///
/// Degrades to an unidentified fingerprint on any connect, write or read
/// failure, keeping whatever partial response arrived as the banner.
pub async fn probe_http(addr: IpAddr, port: u16, io_timeout: Duration) -> ServiceFingerprint {
    let mut response = String::new();

    let exchange = timeout(io_timeout, async {
        let mut stream = TcpStream::connect(SocketAddr::new(addr, port)).await?;

        let request = format!(
            "GET / HTTP/1.1\r\nHost: {}\r\nUser-Agent: deimos/0.3\r\nConnection: close\r\n\r\n",
            addr
        );
        stream.write_all(request.as_bytes()).await?;

        let mut buf = [0u8; 2048];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            response.push_str(&String::from_utf8_lossy(&buf[..n]));
            if response.contains("\r\n\r\n") {
                break;
            }
        }

        Ok::<(), std::io::Error>(())
    })
    .await;

    match exchange {
        Ok(Ok(())) => parse_response(&response),
        // Timeout or socket error: give back what we have, unidentified
        _ => {
            log::debug!("http probe of {}:{} did not complete", addr, port);
            if response.is_empty() {
                ServiceFingerprint::unidentified()
            } else {
                ServiceFingerprint::unidentified_with_banner(response)
            }
        }
    }
}

fn parse_response(response: &str) -> ServiceFingerprint {
    let header = response.split("\r\n\r\n").next().unwrap_or("");

    if !header.starts_with("HTTP/") {
        if header.is_empty() {
            return ServiceFingerprint::unidentified();
        }
        return ServiceFingerprint::unidentified_with_banner(header.to_string());
    }

    let version = SERVER_ENGINE
        .captures(header)
        .map(|caps| {
            let engine = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            match caps.get(2) {
                Some(ver) => format!("{}/{}", engine, ver.as_str()),
                None => engine.to_string(),
            }
        })
        .or_else(|| {
            SERVER_HEADER
                .captures(header)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        });

    let confidence = if version.is_some() {
        patterns::CONFIDENCE_VERSIONED
    } else {
        0.6
    };

    ServiceFingerprint {
        identified: true,
        service: Some("HTTP".to_string()),
        version,
        banner: Some(header.to_string()),
        confidence,
    }
}
