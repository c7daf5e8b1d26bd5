//! TeXURL CLI - download the remote assets of a LaTeX document and relink them

mod logging;
mod paths;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use texurl::{DocumentRewriter, HttpSource, RewriteConfig, RewriteOutcome, DEFAULT_TAGS};

/// Summary format printed after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Short human-readable summary
    #[default]
    Md,
    /// JSON with every download and skip
    Json,
}

/// TeXURL - URL support for LaTeX
#[derive(Parser, Debug)]
#[command(name = "texurl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Output file
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Folder to store the downloaded content
    #[arg(long, short)]
    dump: Option<PathBuf>,

    /// Download every URL present, not only tag arguments
    #[arg(long, short)]
    all: bool,

    /// LaTeX tags that contain required URLs
    #[arg(long, short, num_args = 1.., default_values_t = DEFAULT_TAGS.iter().map(|t| t.to_string()).collect::<Vec<_>>())]
    tag: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Extension for content types with no known mapping (e.g. .bin)
    #[arg(long)]
    fallback_ext: Option<String>,

    /// Leave references to already-downloaded files unchanged
    #[arg(long)]
    keep_cached: bool,

    /// Summary format
    #[arg(long, default_value = "md")]
    report: ReportFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli).await {
        Ok(outcome) => print_report(&outcome, cli.report),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<RewriteOutcome> {
    let paths = paths::resolve(&cli.input, cli.output.as_deref(), cli.dump.as_deref())?;
    for notice in &paths.notices {
        eprintln!("{notice}");
    }

    let text = tokio::fs::read_to_string(&paths.input)
        .await
        .with_context(|| format!("Failed to read {}", paths.input.display()))?;

    let mut builder = HttpSource::builder()
        .probe_timeout(Duration::from_secs(cli.timeout))
        .fetch_timeout(Duration::from_secs(cli.timeout));
    if let Some(ua) = &cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    let source = builder.build().context("Failed to set up HTTP client")?;

    let config = build_config(cli, &paths);
    let outcome = DocumentRewriter::new(&source, config)
        .context("Invalid tag list")?
        .rewrite(&text)
        .await
        .context("Rewrite aborted")?;

    tokio::fs::write(&paths.output, &outcome.text)
        .await
        .with_context(|| format!("Failed to write {}", paths.output.display()))?;
    tracing::info!(output = %paths.output.display(), "Wrote rewritten document");

    Ok(outcome)
}

fn build_config(cli: &Cli, paths: &paths::Paths) -> RewriteConfig {
    let mut config = RewriteConfig::new(&paths.dump_dir)
        .tags(cli.tag.iter().cloned())
        .all(cli.all)
        .link_root(&paths.output_dir)
        .rewrite_cached(!cli.keep_cached);
    if let Some(ext) = &cli.fallback_ext {
        config = config.fallback_extension(ext.clone());
    }
    config
}

fn print_report(outcome: &RewriteOutcome, format: ReportFormat) {
    match format {
        ReportFormat::Md => writeln_safe(&format_summary(outcome)),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(outcome).unwrap_or_else(|e| {
                eprintln!("Error serializing report: {}", e);
                std::process::exit(1);
            });
            writeln_safe(&json);
        }
    }
}

/// Human-readable summary of a run
fn format_summary(outcome: &RewriteOutcome) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "downloaded: {}, reused: {}, skipped: {}\n",
        outcome.fetched_count(),
        outcome.cached_count(),
        outcome.skipped.len()
    ));
    for record in &outcome.downloads {
        let tag = if record.from_cache { "cached" } else { "fetched" };
        output.push_str(&format!(
            "- [{}] {} -> {}\n",
            tag,
            record.url,
            record.local_path.display()
        ));
    }
    for skip in &outcome.skipped {
        output.push_str(&format!("- [skipped] {} ({})\n", skip.url, skip.reason));
    }
    output.truncate(output.trim_end().len());
    output
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
