//! Single-port TCP connect probe
//!
//! One probe = one socket, one bounded connect attempt, one classified
//! outcome. The first terminal event wins: each arm of the match below is a
//! terminal state, so a probe can never be resolved twice even when socket
//! events land close together.

use crate::config::ScanOptions;
use crate::fingerprint::ServiceFingerprint;
use crate::net::{PortBehavior, PortState, ProbeResult};
use crate::ports;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Cap on unsolicited payload kept as the banner
pub const BANNER_CAP: usize = 512;

/// Opens one TCP connection per call and classifies what the socket did.
///
/// Never returns an error to the caller: refused, unreachable and timed-out
/// connects are classifications, not failures.
#[derive(Debug, Clone)]
pub struct PortProber {
    connect_timeout: Duration,
    idle_observe: Duration,
}

impl PortProber {
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            connect_timeout: options.connect_timeout_duration(),
            idle_observe: options.idle_observe_duration(),
        }
    }

    /// Probe one (address, port) pair.
    ///
    /// Bounded by the connect timeout plus the idle-observation window; the
    /// socket is closed on every path before this returns.
    pub async fn probe(&self, addr: IpAddr, port: u16) -> ProbeResult {
        let sock = SocketAddr::new(addr, port);
        let start = Instant::now();
        let mut result = ProbeResult::new(port, ports::port_info(port));

        match timeout(self.connect_timeout, TcpStream::connect(sock)).await {
            Ok(Ok(stream)) => {
                result.state = PortState::Open;
                result.response_time_ms = elapsed_ms(start);
                self.observe_open(stream, start, &mut result).await;
            }
            Ok(Err(e)) => {
                result.response_time_ms = elapsed_ms(start);
                classify_connect_error(&e, &mut result);
                log::debug!("probe {}:{} connect error: {}", addr, port, e);
            }
            Err(_) => {
                result.state = PortState::Filtered;
                result.behavior = Some(PortBehavior::Timeout);
                result.inference =
                    Some("Connection timed out (likely filtered by firewall)".to_string());
                result.response_time_ms = elapsed_ms(start);
            }
        }

        result
    }

    /// Watch an established connection through the idle window and classify
    /// its behavior. Consumes the stream, so the socket is dropped (closed)
    /// on every exit path.
    async fn observe_open(&self, mut stream: TcpStream, start: Instant, result: &mut ProbeResult) {
        let mut buf = [0u8; BANNER_CAP];

        match timeout(self.idle_observe, stream.read(&mut buf)).await {
            // Idle window elapsed with no data: a silent listener
            Err(_) => {
                result.behavior = Some(PortBehavior::Idle);
                result.inference =
                    Some("Service accepts connection and waits for client input".to_string());
            }
            // Orderly close before any payload
            Ok(Ok(0)) => {
                result.behavior = Some(PortBehavior::ImmediateClose);
                result.inference = Some(
                    "Service closes connection immediately (protocol enforcement or proxy)"
                        .to_string(),
                );
                // Classification hinges on the close event, so the clock
                // runs to it
                result.response_time_ms = elapsed_ms(start);
            }
            // Unsolicited payload: keep up to BANNER_CAP as the banner
            Ok(Ok(n)) => {
                result.behavior = Some(PortBehavior::SentData);
                let banner = String::from_utf8_lossy(&buf[..n]).into_owned();

                if let Some(refined) = ports::refine_from_banner(result.port, &banner) {
                    result.info = refined;
                }

                result.fingerprint = Some(ServiceFingerprint::unidentified_with_banner(banner));
            }
            // Reset after accept reads the same as an immediate close
            Ok(Err(e)) => {
                log::debug!("probe port {} read error after connect: {}", result.port, e);
                result.behavior = Some(PortBehavior::ImmediateClose);
                result.inference = Some(
                    "Service closes connection immediately (protocol enforcement or proxy)"
                        .to_string(),
                );
                result.response_time_ms = elapsed_ms(start);
            }
        }
    }
}

/// Map a failed connect to state and inference text.
fn classify_connect_error(e: &io::Error, result: &mut ProbeResult) {
    let msg = e.to_string().to_lowercase();

    if e.kind() == io::ErrorKind::ConnectionRefused {
        result.state = PortState::Closed;
        result.inference = Some("Port is closed (connection actively refused)".to_string());
    } else if e.kind() == io::ErrorKind::TimedOut
        || msg.contains("unreachable")
        || msg.contains("no route")
    {
        result.state = PortState::Filtered;
        result.inference = Some("Port is filtered (firewall/no route to host)".to_string());
    } else {
        result.state = PortState::Filtered;
        result.inference = Some(format!("Error: {}", e));
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_for_test() -> PortProber {
        PortProber::new(
            &ScanOptions::new()
                .with_connect_timeout(500)
                .with_idle_observe(150),
        )
    }

    #[test]
    fn test_classify_refused() {
        let mut result = ProbeResult::new(80, ports::port_info(80));
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        classify_connect_error(&err, &mut result);
        assert_eq!(result.state, PortState::Closed);
        assert!(result.inference.as_deref().unwrap().contains("actively refused"));
    }

    #[test]
    fn test_classify_unreachable() {
        let mut result = ProbeResult::new(80, ports::port_info(80));
        let err = io::Error::new(io::ErrorKind::Other, "No route to host (os error 113): host unreachable");
        classify_connect_error(&err, &mut result);
        assert_eq!(result.state, PortState::Filtered);
        assert!(result.inference.as_deref().unwrap().contains("firewall"));
    }

    #[test]
    fn test_classify_other_error_preserves_message() {
        let mut result = ProbeResult::new(80, ports::port_info(80));
        let err = io::Error::new(io::ErrorKind::Other, "strange failure");
        classify_connect_error(&err, &mut result);
        assert_eq!(result.state, PortState::Filtered);
        assert!(result.inference.as_deref().unwrap().contains("strange failure"));
    }

    #[tokio::test]
    async fn test_probe_refused_port() {
        // Bind then drop a listener so the port is known-free, then probe it
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = probe_for_test()
            .probe("127.0.0.1".parse().unwrap(), port)
            .await;

        assert_eq!(result.state, PortState::Closed);
        assert!(result.behavior.is_none());
        assert!(result.fingerprint.is_none());
        assert!(result.vulnerabilities.is_empty());
    }

    #[tokio::test]
    async fn test_probe_idle_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept but never write, never close
        let server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let result = probe_for_test()
            .probe("127.0.0.1".parse().unwrap(), port)
            .await;

        assert_eq!(result.state, PortState::Open);
        assert_eq!(result.behavior, Some(PortBehavior::Idle));
        assert!(result.banner().is_none());

        server.abort();
    }

    #[tokio::test]
    async fn test_probe_banner_sender() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let result = probe_for_test()
            .probe("127.0.0.1".parse().unwrap(), port)
            .await;

        assert_eq!(result.state, PortState::Open);
        assert_eq!(result.behavior, Some(PortBehavior::SentData));
        assert_eq!(result.banner(), Some("SSH-2.0-OpenSSH_9.6\r\n"));

        server.abort();
    }

    #[tokio::test]
    async fn test_probe_immediate_close() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let result = probe_for_test()
            .probe("127.0.0.1".parse().unwrap(), port)
            .await;

        assert_eq!(result.state, PortState::Open);
        assert_eq!(result.behavior, Some(PortBehavior::ImmediateClose));

        server.abort();
    }
}
