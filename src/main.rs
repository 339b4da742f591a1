use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use std::process;

use deimos::{
    config::ScanOptions,
    output::{OutputConfig, OutputFormat, OutputManager},
    scanner::engine::ScanEngine,
    ScanReport,
};

// Exit codes: findings drive the status so the binary slots into CI checks
const EXIT_CLEAN: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_HIGH: i32 = 2;
const EXIT_CRITICAL: i32 = 3;

// Ulimit adjustment for Unix systems: a full-range connect sweep keeps
// hundreds of sockets open and the default soft limit is often 1024
#[cfg(unix)]
fn adjust_ulimit_size(requested: u64) -> u64 {
    use rlimit::Resource;

    if Resource::NOFILE.set(requested, requested).is_ok() {
        log::debug!("raised file descriptor limit to {}", requested);
    }

    match Resource::NOFILE.get() {
        Ok((soft, _)) => soft,
        Err(_) => {
            eprintln!("{}", "[!] WARNING: Could not get file descriptor limit".bright_yellow());
            65535
        }
    }
}

#[cfg(not(unix))]
fn adjust_ulimit_size(_requested: u64) -> u64 {
    65535
}

fn print_banner() {
    println!("{}", " _     _                  ".bright_red().bold());
    println!("{}", "| | ___(_)_ __ ___   ___  ___ ".bright_red().bold());
    println!("{}", "| |/ _ \\ | '_ ` _ \\ / _ \\/ __|".bright_red().bold());
    println!("{}", "| |  __/ | | | | | | (_) \\__ \\".bright_red().bold());
    println!("{}", "|_|\\___|_|_| |_| |_|\\___/|___/  deimos".bright_red().bold());
    println!();
    println!("{}", "TCP reconnaissance: probe, classify, fingerprint".bright_blue());
    println!();
}

fn build_cli() -> Command {
    Command::new("deimos")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Async TCP reconnaissance engine")
        .arg(
            Arg::new("host")
                .help("Target hostname or IP address")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("quick")
                .short('q')
                .long("quick")
                .help("Quick scan (common ports only)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("range")
                .short('r')
                .long("range")
                .value_name("START-END")
                .help("Port range, e.g. 1-1000"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("MS")
                .help("Connection timeout in milliseconds"),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("N")
                .help("Maximum concurrent connections"),
        )
        .arg(
            Arg::new("no-fingerprint")
                .long("no-fingerprint")
                .help("Disable service fingerprinting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-vuln-check")
                .long("no-vuln-check")
                .help("Disable vulnerability checks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Output results as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the report to a file instead of stdout"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
}

/// Parse "START-END" into a port range pair.
fn parse_range(spec: &str) -> anyhow::Result<(u16, u16)> {
    let (start, end) = spec
        .split_once('-')
        .with_context(|| format!("expected START-END, got '{}'", spec))?;

    let start: u16 = start.trim().parse().context("invalid range start")?;
    let end: u16 = end.trim().parse().context("invalid range end")?;

    Ok((start, end))
}

fn exit_code_for(report: &ScanReport) -> i32 {
    if report.summary.critical > 0 {
        EXIT_CRITICAL
    } else if report.summary.high > 0 {
        EXIT_HIGH
    } else {
        EXIT_CLEAN
    }
}

async fn run() -> anyhow::Result<i32> {
    let matches = build_cli().get_matches();

    let host = matches.get_one::<String>("host").expect("host is required");
    let quick = matches.get_flag("quick");
    let json = matches.get_flag("json");

    let mut options = ScanOptions::load_default_config();

    if let Some(timeout) = matches.get_one::<String>("timeout") {
        options = options.with_connect_timeout(timeout.parse().context("invalid timeout")?);
    }

    if let Some(concurrency) = matches.get_one::<String>("concurrency") {
        options =
            options.with_max_concurrency(concurrency.parse().context("invalid concurrency")?);
    }

    let range = matches
        .get_one::<String>("range")
        .map(|spec| parse_range(spec))
        .transpose()?;

    if let Some((start, end)) = range {
        options = options.with_port_range(start, end);
    }

    options = options
        .with_fingerprinting(!matches.get_flag("no-fingerprint"))
        .with_vuln_checks(!matches.get_flag("no-vuln-check"));

    if !json {
        print_banner();
    }

    // Headroom above the worker pool for fingerprint/stability sockets
    adjust_ulimit_size((options.max_concurrency as u64).saturating_mul(4).max(8192));

    let engine = ScanEngine::new(options)?;

    let report = if quick {
        engine.quick_scan(host).await?
    } else {
        engine.scan(host).await?
    };

    let output_config = OutputConfig {
        format: if json { OutputFormat::Json } else { OutputFormat::Text },
        file: matches.get_one::<String>("output").cloned(),
        colored: !matches.get_flag("no-color"),
    };

    OutputManager::new(output_config).write_report(&report)?;

    Ok(exit_code_for(&report))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "[!]".bright_red(), e);
            process::exit(EXIT_ERROR);
        }
    }
}
