//! CLI entrypoint for the spindle soak harness.
//!
//! ```text
//! harness soak --profile quick --log soak.jsonl --report soak.json
//! harness validate-log --log soak.jsonl
//! harness report --input soak.json --output soak.md
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use spindle_harness::HarnessError;
use spindle_harness::config::SoakProfile;
use spindle_harness::report::SoakReport;
use spindle_harness::runner::SoakRunner;
use spindle_harness::structured_log::{LogEmitter, validate_log_file};

#[derive(Debug, Parser)]
#[command(name = "spindle-harness")]
#[command(about = "Soak and verification tooling for the spindle thread primitives")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the soak cases; optionally emit a JSONL log and a JSON report.
    Soak {
        /// Workload profile: quick, standard, or extended. Falls back to
        /// SPINDLE_SOAK_PROFILE, then to standard.
        #[arg(long)]
        profile: Option<String>,

        /// Override the profile's worker count.
        #[arg(long)]
        workers: Option<u32>,

        /// Override the profile's cycle count.
        #[arg(long)]
        cycles: Option<u64>,

        /// Campaign name stamped into trace ids and the report.
        #[arg(long, default_value = "soak")]
        campaign: String,

        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,

        /// JSON report output path.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check a JSONL log against the structured-log schema.
    ValidateLog {
        /// Log file to validate.
        #[arg(long)]
        log: PathBuf,
    },

    /// Render a JSON soak report as markdown.
    Report {
        /// JSON report produced by `soak --report`.
        #[arg(long)]
        input: PathBuf,

        /// Markdown output path; prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool, HarnessError> {
    match cli.command {
        Command::Soak {
            profile,
            workers,
            cycles,
            campaign,
            log,
            report,
        } => {
            let profile = profile.map_or_else(SoakProfile::from_env, |raw| {
                SoakProfile::from_str_loose(&raw)
            });
            let mut params = profile.params();
            if let Some(workers) = workers {
                params.workers = workers;
            }
            if let Some(cycles) = cycles {
                params.cycles = cycles;
            }

            let run_id = format!("run-{}", std::process::id());
            let mut emitter = match &log {
                Some(path) => LogEmitter::to_file(path, &campaign, &run_id)?,
                None => LogEmitter::to_buffer(&campaign, &run_id),
            };

            let runner = SoakRunner::new(campaign, params);
            let results = runner.run(&mut emitter)?;

            let summary =
                SoakReport::from_results(runner.campaign(), profile.name(), results);
            if let Some(path) = &report {
                summary.write_json(path)?;
            }
            print!("{}", summary.to_markdown());
            Ok(summary.all_passed())
        }
        Command::ValidateLog { log } => {
            let (validated, errors) = validate_log_file(&log)?;
            if errors.is_empty() {
                println!("{validated} log lines validated");
                Ok(true)
            } else {
                for error in &errors {
                    eprintln!("{error}");
                }
                eprintln!("{validated} lines validated, {} violations", errors.len());
                Ok(false)
            }
        }
        Command::Report { input, output } => {
            let report = SoakReport::from_json_file(&input)?;
            let markdown = report.to_markdown();
            match output {
                Some(path) => std::fs::write(path, markdown)?,
                None => print!("{markdown}"),
            }
            Ok(true)
        }
    }
}
