//! Scan engine driving the probe/assess/fingerprint/analyze pipeline

use crate::config::ScanOptions;
use crate::fingerprint::Fingerprinter;
use crate::net::{self, PortProber, Stability, StabilityAssessor, ProbeResult};
use crate::ports::COMMON_PORTS;
use crate::scanner::ScanReport;
use crate::vuln::VulnAnalyzer;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Orchestrates a scan: sweeps ports with bounded fan-out and runs every
/// open port through stability assessment, fingerprinting and vulnerability
/// analysis before it reaches the report.
#[derive(Debug, Clone)]
pub struct ScanEngine {
    options: ScanOptions,
    prober: PortProber,
    assessor: StabilityAssessor,
    fingerprinter: Fingerprinter,
    analyzer: VulnAnalyzer,
}

impl ScanEngine {
    /// Create an engine with validated options.
    pub fn new(options: ScanOptions) -> crate::Result<Self> {
        options.validate()?;

        let prober = PortProber::new(&options);
        let assessor = StabilityAssessor::new(&options);

        Ok(Self {
            options,
            prober,
            assessor,
            fingerprinter: Fingerprinter::new(),
            analyzer: VulnAnalyzer::new(),
        })
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Sweep the configured port range against a host.
    pub async fn scan(&self, host: &str) -> crate::Result<ScanReport> {
        let range = self.options.port_range;
        self.scan_range(host, range.start, range.end).await
    }

    /// Sweep an explicit port range against a host.
    pub async fn scan_range(&self, host: &str, start: u16, end: u16) -> crate::Result<ScanReport> {
        if start == 0 || start > end {
            return Err(crate::ScanError::PortRangeError(format!(
                "invalid range {}-{}",
                start, end
            )));
        }

        let scan_start = Instant::now();
        let ip = net::resolve(host).await?;
        let total = (end as usize) - (start as usize) + 1;

        log::info!(
            "scanning {} ({}) ports {}-{} with {} workers",
            host,
            ip,
            start,
            end,
            self.options.max_concurrency.min(total)
        );

        let open_ports = self.sweep(ip, start, end).await;

        log::info!(
            "scan of {} finished: {}/{} ports open",
            host,
            open_ports.len(),
            total
        );

        Ok(ScanReport::assemble(
            host.to_string(),
            ip.to_string(),
            open_ports,
            total,
            elapsed_ms(scan_start),
        ))
    }

    /// Probe the curated common-port list, all at once.
    ///
    /// The list is small and fixed, so the sweep's concurrency bound does
    /// not apply; every probe is issued immediately.
    pub async fn quick_scan(&self, host: &str) -> crate::Result<ScanReport> {
        let scan_start = Instant::now();
        let ip = net::resolve(host).await?;

        log::info!("quick scan of {} ({}): {} ports", host, ip, COMMON_PORTS.len());

        let probes = COMMON_PORTS.iter().map(|&port| self.prober.probe(ip, port));
        let results = futures::future::join_all(probes).await;

        let mut open_ports = Vec::new();
        for result in results {
            if result.is_open() {
                open_ports.push(self.enrich(ip, result).await);
            }
        }

        Ok(ScanReport::assemble(
            host.to_string(),
            ip.to_string(),
            open_ports,
            COMMON_PORTS.len(),
            elapsed_ms(scan_start),
        ))
    }

    /// Run the bounded worker pool over [start, end].
    ///
    /// Each worker owns at most one socket at a time and claims the next
    /// unscanned port from a shared atomic counter, so every port is probed
    /// exactly once and never more than `max_concurrency` probes are in
    /// flight.
    async fn sweep(&self, addr: IpAddr, start: u16, end: u16) -> Vec<ProbeResult> {
        let total = (end as usize) - (start as usize) + 1;
        let workers = self.options.max_concurrency.min(total);

        let next_port = Arc::new(AtomicU32::new(start as u32));
        let collector: Arc<Mutex<Vec<ProbeResult>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let engine = self.clone();
            let next_port = Arc::clone(&next_port);
            let collector = Arc::clone(&collector);

            handles.push(tokio::spawn(async move {
                loop {
                    let claimed = next_port.fetch_add(1, Ordering::SeqCst);
                    if claimed > end as u32 {
                        break;
                    }

                    let port = claimed as u16;
                    let result = engine.prober.probe(addr, port).await;
                    if !result.is_open() {
                        continue;
                    }

                    let enriched = engine.enrich(addr, result).await;
                    collector.lock().await.push(enriched);
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                log::warn!("scan worker aborted: {}", e);
            }
        }

        let mut results = collector.lock().await;
        std::mem::take(&mut *results)
    }

    /// Enrich a confirmed-open probe result in pipeline order: stability,
    /// then fingerprint, then vulnerability analysis. Each stage produces a
    /// complete value that is merged here, never mutated from elsewhere.
    async fn enrich(&self, addr: IpAddr, mut result: ProbeResult) -> ProbeResult {
        let port = result.port;

        let stability = self.assessor.assess(&self.prober, addr, port).await;
        result.stability = Some(stability);
        if stability == Stability::Ephemeral {
            result.inference = Some(
                "Ephemeral/dynamic port (likely outbound connection, not service)".to_string(),
            );
        }

        if self.options.fingerprinting {
            let banner = result.banner().map(str::to_string);
            let fingerprint = self
                .fingerprinter
                .fingerprint(addr, port, banner.as_deref())
                .await;
            result.fingerprint = Some(fingerprint);
        }

        if self.options.vuln_checks {
            result.vulnerabilities = self.analyzer.analyze(&result);
        }

        result
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_options() {
        let options = ScanOptions::new().with_port_range(100, 10);
        assert!(ScanEngine::new(options).is_err());
    }

    #[tokio::test]
    async fn test_scan_range_rejects_inverted_range() {
        let engine = ScanEngine::new(ScanOptions::default()).unwrap();
        let err = engine.scan_range("127.0.0.1", 200, 100).await.unwrap_err();
        assert!(matches!(err, crate::ScanError::PortRangeError(_)));
    }

    #[tokio::test]
    async fn test_scan_unresolvable_host_is_fatal() {
        let options = ScanOptions::new().with_port_range(1, 10);
        let engine = ScanEngine::new(options).unwrap();
        let err = engine.scan("no-such-host.invalid").await.unwrap_err();
        assert!(matches!(err, crate::ScanError::ResolveError(_)));
    }
}
