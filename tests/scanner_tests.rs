//! End-to-end orchestrator tests against localhost listeners

use deimos::config::ScanOptions;
use deimos::scanner::engine::ScanEngine;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn fast_options() -> ScanOptions {
    ScanOptions::new()
        .with_connect_timeout(500)
        .with_idle_observe(150)
        .with_stability_retries(1)
        .with_stability_delay(20)
}

/// Listener that greets every connection with a canned payload.
async fn spawn_greeting_server(payload: &'static [u8]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let _ = stream.write_all(payload).await;
                tokio::time::sleep(Duration::from_millis(300)).await;
            });
        }
    });

    port
}

#[tokio::test]
async fn range_scan_finds_single_http_server() {
    let port = spawn_greeting_server(b"HTTP/1.1 200 OK\r\nServer: nginx/1.18.0\r\n\r\n").await;

    // A tight window around the listener; the neighbors refuse instantly
    let start = port - 2;
    let end = port + 2;

    let engine = ScanEngine::new(fast_options().with_max_concurrency(5)).unwrap();
    let report = engine.scan_range("127.0.0.1", start, end).await.unwrap();

    assert_eq!(report.total_ports_scanned, 5);
    assert_eq!(report.open_ports.len(), 1);

    let open = &report.open_ports[0];
    assert_eq!(open.port, port);

    let fp = open.fingerprint.as_ref().unwrap();
    assert!(fp.identified);
    assert_eq!(fp.service.as_deref(), Some("HTTP"));
    assert!(fp.version.as_deref().unwrap().contains("1.18.0"));
}

#[tokio::test]
async fn all_unreachable_range_yields_empty_clean_report() {
    let options = fast_options()
        .with_connect_timeout(150)
        .with_max_concurrency(50);
    let engine = ScanEngine::new(options).unwrap();

    let report = engine.scan_range("192.0.2.1", 1, 50).await.unwrap();

    assert_eq!(report.total_ports_scanned, 50);
    assert!(report.open_ports.is_empty());
    assert!(report.summary.is_clean());
    assert_eq!(report.risk_score, 0);
}

#[tokio::test]
async fn open_ports_are_sorted_ascending() {
    let a = spawn_greeting_server(b"SSH-2.0-OpenSSH_9.6\r\n").await;
    let b = spawn_greeting_server(b"220 mail ESMTP ready\r\n").await;

    let (lo, hi) = (a.min(b), a.max(b));
    let engine = ScanEngine::new(fast_options().with_max_concurrency(40)).unwrap();
    let report = engine.scan_range("127.0.0.1", lo, hi).await.unwrap();

    let ports: Vec<u16> = report.open_ports.iter().map(|r| r.port).collect();
    let mut sorted = ports.clone();
    sorted.sort_unstable();
    assert_eq!(ports, sorted);
    assert!(ports.contains(&a) && ports.contains(&b));
    assert!(report.open_ports.len() <= report.total_ports_scanned);
}

#[tokio::test]
async fn quick_scan_identifies_mock_redis() {
    // The curated list pins Redis to 6379; skip when the port is taken
    let listener = match TcpListener::bind("127.0.0.1:6379").await {
        Ok(listener) => listener,
        Err(_) => {
            println!("port 6379 unavailable - skipping quick scan test");
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut buf = [0u8; 256];

                while let Ok(n) = stream.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                    let cmd = String::from_utf8_lossy(&buf[..n]);
                    if cmd.starts_with("PING") {
                        let _ = stream.write_all(b"+PONG\r\n").await;
                    } else if cmd.starts_with("INFO") {
                        let _ = stream
                            .write_all(b"$52\r\n# Server\r\nredis_version:7.2.0\r\nredis_mode:standalone\r\n")
                            .await;
                    }
                }
            });
        }
    });

    let engine = ScanEngine::new(fast_options()).unwrap();
    let report = engine.quick_scan("127.0.0.1").await.unwrap();

    assert_eq!(report.total_ports_scanned, 23);

    let redis = report
        .open_ports
        .iter()
        .find(|r| r.port == 6379)
        .expect("mock redis not discovered");

    let fp = redis.fingerprint.as_ref().unwrap();
    assert!(fp.identified);
    assert_eq!(fp.service.as_deref(), Some("Redis"));
    assert_eq!(fp.version.as_deref(), Some("7.2.0"));

    // An unauthenticated PONG is a critical finding
    assert!(report.summary.critical >= 1);
}

#[tokio::test]
async fn worker_pool_never_exceeds_concurrency_bound() {
    const LIMIT: usize = 3;

    let current = Arc::new(AtomicUsize::new(0));
    let observed_max = Arc::new(AtomicUsize::new(0));

    // A dozen silent listeners that track how many probe sockets are held
    // open against them at once
    let mut ports = Vec::new();
    for _ in 0..12 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        ports.push(listener.local_addr().unwrap().port());

        let current = Arc::clone(&current);
        let observed_max = Arc::clone(&observed_max);
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                let current = Arc::clone(&current);
                let observed_max = Arc::clone(&observed_max);
                tokio::spawn(async move {
                    let held = current.fetch_add(1, Ordering::SeqCst) + 1;
                    observed_max.fetch_max(held, Ordering::SeqCst);

                    // Hold until the prober closes its end
                    let mut buf = [0u8; 8];
                    while let Ok(n) = stream.read(&mut buf).await {
                        if n == 0 {
                            break;
                        }
                    }

                    current.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });
    }

    let lo = *ports.iter().min().unwrap();
    let hi = *ports.iter().max().unwrap();

    let options = ScanOptions::new()
        .with_connect_timeout(500)
        .with_idle_observe(100)
        .with_stability_retries(0)
        .with_fingerprinting(false)
        .with_vuln_checks(false)
        .with_max_concurrency(LIMIT);

    let engine = ScanEngine::new(options).unwrap();
    let report = engine.scan_range("127.0.0.1", lo, hi).await.unwrap();

    assert!(
        observed_max.load(Ordering::SeqCst) <= LIMIT,
        "more than {} probe sockets were open at once",
        LIMIT
    );

    for port in ports {
        assert!(report.open_ports.iter().any(|r| r.port == port));
    }
}

#[tokio::test]
async fn disabled_enrichments_leave_fields_untouched() {
    let port = spawn_greeting_server(b"SSH-2.0-OpenSSH_9.6\r\n").await;

    let options = fast_options()
        .with_fingerprinting(false)
        .with_vuln_checks(false)
        .with_max_concurrency(4);
    let engine = ScanEngine::new(options).unwrap();

    let report = engine.scan_range("127.0.0.1", port, port).await.unwrap();
    let open = &report.open_ports[0];

    // The prober-captured banner survives, but stays unidentified
    let fp = open.fingerprint.as_ref().unwrap();
    assert!(!fp.identified);
    assert!(fp.banner.is_some());
    assert!(open.vulnerabilities.is_empty());
    assert!(open.stability.is_some());
}
