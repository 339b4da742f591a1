//! Redis wire-protocol handshake
//!
//! Two steps: a PING to confirm the peer speaks RESP, then INFO SERVER to
//! pull the version token. Anything unexpected at either step means this is
//! not a Redis we can identify.

use crate::fingerprint::{patterns, ServiceFingerprint};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

static REDIS_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"redis_version:([\d.]+)").unwrap());

/// Probe (addr, port) as a Redis endpoint.
pub async fn probe_redis(addr: IpAddr, port: u16, io_timeout: Duration) -> ServiceFingerprint {
    match timeout(io_timeout, handshake(addr, port)).await {
        Ok(Ok(fp)) => fp,
        Ok(Err(e)) => {
            log::debug!("redis probe of {}:{} failed: {}", addr, port, e);
            ServiceFingerprint::unidentified()
        }
        Err(_) => ServiceFingerprint::unidentified(),
    }
}

async fn handshake(addr: IpAddr, port: u16) -> std::io::Result<ServiceFingerprint> {
    let mut stream = TcpStream::connect(SocketAddr::new(addr, port)).await?;

    // Step 1: liveness
    stream.write_all(b"PING\r\n").await?;

    let mut buf = [0u8; 256];
    let n = stream.read(&mut buf).await?;
    let reply = String::from_utf8_lossy(&buf[..n]).into_owned();

    if !reply.contains("+PONG") {
        return Ok(ServiceFingerprint::unidentified_with_banner(reply));
    }

    // Step 2: server info
    stream.write_all(b"INFO SERVER\r\n").await?;

    let mut info = String::new();
    let mut chunk = [0u8; 2048];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        info.push_str(&String::from_utf8_lossy(&chunk[..n]));
        if info.contains("redis_version:") || info.contains("\r\n") {
            break;
        }
    }

    if info.is_empty() {
        return Ok(ServiceFingerprint::unidentified());
    }

    let version = REDIS_VERSION
        .captures(&info)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let confidence = if version.is_some() {
        patterns::CONFIDENCE_VERSIONED
    } else {
        patterns::CONFIDENCE_PRESENCE
    };

    Ok(ServiceFingerprint {
        identified: true,
        service: Some("Redis".to_string()),
        version,
        banner: Some(info),
        confidence,
    })
}
