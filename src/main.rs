use anyhow::Result;
use clap::{Parser, Subcommand};
use commit_mirror::config::Config;
use commit_mirror::pipeline;
use commit_mirror::record::{SyncMode, SyncOutcome};
use std::path::PathBuf;
use std::process::ExitCode;

/// Mirror commit metadata from private repositories into a public activity
/// timeline of empty commits
#[derive(Parser)]
#[command(
    name = "commit-mirror",
    version,
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ", built ", env!("BUILD_TIMESTAMP"), ")"
    )
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "COMMIT_MIRROR_CONFIG")]
    config: Option<PathBuf>,

    /// Report per-repository contributor emails while harvesting
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest new commits and append them to the destination
    Sync,

    /// Show what a sync would do without writing anything
    Preview {
        /// Only preview sources whose label contains this substring
        pattern: Option<String>,
    },

    /// Discard all destination history and rebuild it from the full harvest
    Rebuild {
        /// Confirm the destructive rebuild
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Sync => {
            let outcome = pipeline::run(&config, SyncMode::Incremental, cli.verbose)?;
            report_outcome(&outcome);
        }
        Command::Preview { pattern } => {
            let report = pipeline::preview(&config, pattern.as_deref(), cli.verbose)?;
            print_preview(&report);
        }
        Command::Rebuild { yes } => {
            if !yes {
                eprintln!(
                    "rebuild discards all destination history; re-run with --yes to confirm"
                );
                return Ok(ExitCode::FAILURE);
            }
            let outcome = pipeline::run(&config, SyncMode::Rebuild, cli.verbose)?;
            report_outcome(&outcome);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Synced {
            count,
            newest_timestamp,
        } => {
            println!(
                "synced {} commits, watermark now {} ({})",
                count,
                newest_timestamp,
                format_timestamp(*newest_timestamp)
            );
        }
        SyncOutcome::NothingToDo => {
            println!("nothing to do: no new commits to mirror");
        }
    }
}

fn print_preview(report: &commit_mirror::record::PreviewReport) {
    match report.watermark {
        Some(watermark) => println!(
            "watermark: {} ({})",
            watermark,
            format_timestamp(watermark)
        ),
        None => println!("watermark: none (first sync)"),
    }
    println!("{} candidate commits", report.candidate_count);

    for record in &report.head {
        println!("  {}  {}", format_timestamp(record.timestamp), record.message);
    }
    if !report.tail.is_empty() {
        println!("  ...");
        for record in &report.tail {
            println!("  {}  {}", format_timestamp(record.timestamp), record.message);
        }
    }
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "invalid timestamp".to_string())
}
