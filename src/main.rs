use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use nondet_eval::commands::{self, AnalyzeArgs, CorrectionsArgs, ErrorsArgs, ParamsArgs, TaskArgs};
use nondet_eval::config::EvalConfig;
use nondet_eval::logger;

#[derive(Parser)]
#[command(
    name = "nondet-eval",
    version,
    about = "Measure how much repeated code generations for the same task differ, in text, structure and test outcome."
)]
struct Cli {
    #[arg(long, global = true, help = "Config file (default: <config dir>/nondet-eval/config.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Log filter, e.g. debug or nondet_eval=trace")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Score non-determinism for every task in a results file or directory
    Analyze(AnalyzeArgs),
    /// Detailed comparison of the candidates of a single task
    Task(TaskArgs),
    /// Break failures down by error category
    Errors(ErrorsArgs),
    /// Compare error categories between two runs
    Corrections(CorrectionsArgs),
    /// Relate sampling configurations and parameters to pass rate
    Params(ParamsArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = EvalConfig::load(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.effective_log_level());
    logger::init(&level);

    match cli.command {
        CliCommand::Analyze(args) => commands::analyze(args, &config),
        CliCommand::Task(args) => commands::task(args, &config),
        CliCommand::Errors(args) => commands::errors(args, &config),
        CliCommand::Corrections(args) => commands::corrections(args, &config),
        CliCommand::Params(args) => commands::params(args),
    }
}
