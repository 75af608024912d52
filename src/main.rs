use anyhow::{Context, Result};
use clap::Parser;
use datalab::report::{self, PerformanceSummary, Report};
use datalab::{analyze, analyze_file, Config, Log, TracingLog};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "datalab", version, about = "Summarize the columns of a CSV file")]
struct Args {
    /// CSV file to analyze; the configured default file if omitted
    file: Option<PathBuf>,
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print the statistics as JSON instead of a text report
    #[arg(long)]
    json: bool,
    /// Also write the text report into the reports directory
    #[arg(long)]
    save_report: bool,
    /// Print how long each step took
    #[arg(long)]
    timings: bool,
    /// Log debug messages
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    tracing::debug!(?config, "configuration loaded");

    let log = TracingLog;
    let analysis = match &args.file {
        Some(path) => analyze_file(&config, path, &log)?,
        None => analyze(&config, &log)?,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&analysis).context("cannot encode result")?;
        println!("{}", json);
    } else {
        println!(
            "{}",
            Report::new(&analysis, "DataLab CSV Analysis").with_config(&config)
        );
    }
    if args.timings {
        println!("{}", PerformanceSummary::new(&analysis.timings));
    }

    if args.save_report {
        let text = Report::new(&analysis, "DataLab CSV Analysis Report")
            .with_config(&config)
            .to_string();
        let path = report::save(&text, &config.reports_dir, None)?;
        log.info(&format!("report saved to {}", path.display()));
    }
    Ok(())
}
