//! Parapet CLI - Operator tooling for the web application firewall

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use parapet_audit::{
    paginate, read_tail, stats, threat_map, to_csv, to_json, ConfigStore, MemorySink,
    ToggleUpdate, DEFAULT_TAIL_CAP, PAGE_SIZE,
};
use parapet_core::{InboundRequest, Parapet, ParapetConfig};
use parapet_signatures::{normalize_text, SignatureScorer};

#[derive(Parser)]
#[command(name = "parapet")]
#[command(about = "Parapet - signature WAF with rate limiting and ban tracking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Score a payload against the signature table
    Scan {
        /// Payload text, URL-encoded or plain
        payload: String,
    },
    /// Decide one synthetic request through the full engine
    Check {
        /// Target URL
        url: String,
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Source address to attribute the request to
        #[arg(long, default_value = "203.0.113.1")]
        ip: String,
        /// Raw body text
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Summarize the audit trail
    Stats {
        /// Audit trail path
        #[arg(short, long, default_value = "waf_logs.json")]
        log: PathBuf,
    },
    /// Print the newest trail entries
    Tail {
        /// Audit trail path
        #[arg(short, long, default_value = "waf_logs.json")]
        log: PathBuf,
        /// Entries to print
        #[arg(short, long, default_value_t = PAGE_SIZE)]
        count: usize,
    },
    /// Export the trail as JSON or CSV
    Export {
        /// Audit trail path
        #[arg(short, long, default_value = "waf_logs.json")]
        log: PathBuf,
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Read or change the protection toggles
    Toggles {
        /// Toggle file path
        #[arg(long, default_value = "waf_config.json")]
        config: PathBuf,
        /// Enable or disable SQL injection blocking
        #[arg(long)]
        enable_sqli: Option<bool>,
        /// Enable or disable XSS blocking
        #[arg(long)]
        enable_xss: Option<bool>,
        /// Enable or disable rate limiting
        #[arg(long)]
        enable_rate_limit: Option<bool>,
        /// Enable or disable brute-force lockout
        #[arg(long)]
        enable_bruteforce: Option<bool>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match cli.command {
        Some(Commands::Scan { payload }) => scan(&payload),
        Some(Commands::Check { url, method, ip, data }) => check(&url, &method, &ip, data),
        Some(Commands::Stats { log }) => print_stats(&log),
        Some(Commands::Tail { log, count }) => tail(&log, count),
        Some(Commands::Export { log, format, out }) => export(&log, format, out.as_deref()),
        Some(Commands::Toggles {
            config,
            enable_sqli,
            enable_xss,
            enable_rate_limit,
            enable_bruteforce,
        }) => toggles(
            &config,
            ToggleUpdate {
                enable_sqli,
                enable_xss,
                enable_rate_limit,
                enable_bruteforce,
            },
        ),
        None => {
            println!("Parapet v0.1.0 - Use --help for commands");
            Ok(())
        }
    }
}

fn scan(payload: &str) -> anyhow::Result<()> {
    let scorer = SignatureScorer::new();
    let normalized = normalize_text(payload);
    let score = scorer.score(&normalized);

    println!("payload:    {normalized}");
    println!("severity:   {}", score.severity);
    if score.is_clean() {
        println!("categories: none");
        return Ok(());
    }
    let categories: Vec<String> = score.categories.iter().map(ToString::to_string).collect();
    println!("categories: {}", categories.join(", "));
    for description in scorer.explain(&normalized) {
        println!("  - {description}");
    }
    Ok(())
}

fn check(url: &str, method: &str, ip: &str, data: Option<String>) -> anyhow::Result<()> {
    let sink = Arc::new(MemorySink::new());
    let engine = Parapet::new(ParapetConfig::default(), sink.clone())
        .context("building engine")?;

    let mut request = InboundRequest::new(ip, method.to_ascii_uppercase(), url);
    if let Some(body) = data {
        request = request.with_body(body);
    }

    let verdict = engine.decide(&request);
    match verdict.reason() {
        Some(reason) => println!("BLOCKED {} - {}", verdict.status(), reason.body()),
        None => println!("ALLOWED"),
    }
    for entry in sink.entries() {
        println!("log: {}", serde_json::to_string(&entry)?);
    }
    Ok(())
}

fn print_stats(log: &Path) -> anyhow::Result<()> {
    let entries = read_tail(log, DEFAULT_TAIL_CAP)
        .with_context(|| format!("reading {}", log.display()))?;

    let totals = stats(&entries);
    println!("{}", serde_json::to_string_pretty(&totals)?);

    let threats = threat_map(&entries);
    if !threats.is_empty() {
        println!("blocked by source:");
        for (ip, count) in threats {
            println!("  {ip}: {count}");
        }
    }
    Ok(())
}

fn tail(log: &Path, count: usize) -> anyhow::Result<()> {
    let entries = read_tail(log, DEFAULT_TAIL_CAP)
        .with_context(|| format!("reading {}", log.display()))?;

    let page = paginate(&entries, 1, count.max(1));
    for entry in &page.entries {
        println!(
            "{} {} {} {} {} {}",
            entry.time, entry.ip, entry.method, entry.action, entry.attack, entry.url
        );
    }
    Ok(())
}

fn export(
    log: &Path,
    format: ExportFormat,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let entries = read_tail(log, DEFAULT_TAIL_CAP)
        .with_context(|| format!("reading {}", log.display()))?;

    let rendered = match format {
        ExportFormat::Json => to_json(&entries)?,
        ExportFormat::Csv => to_csv(&entries),
    };

    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), entries = entries.len(), "export written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn toggles(config: &Path, update: ToggleUpdate) -> anyhow::Result<()> {
    let store = ConfigStore::new(config);

    let current = if update == ToggleUpdate::default() {
        store.load()
    } else {
        store
            .apply(&update)
            .with_context(|| format!("updating {}", config.display()))?
    };
    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}
