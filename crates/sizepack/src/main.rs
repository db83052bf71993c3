use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, error};
use sizepack::{
    error::BuildError,
    orchestrator::{BuildRequest, build},
};

/// Pack an HTML document with inline script and shader into a size-coding build
#[derive(Parser, Debug)]
#[command(name = "sizepack", version, about, long_about = None)]
struct Cli {
    /// Document to build, e.g. `intro.html` (writes `intro-build.html`)
    input: Option<PathBuf>,

    /// Configuration file (defaults to `sizepack.toml` beside the input)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path instead of the derived `<name>-build.<ext>`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for intermediate files
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Warn
    } else {
        match cli.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let input = cli.input.ok_or(BuildError::MissingInput)?;
    build(&BuildRequest {
        input,
        config: cli.config,
        output: cli.output,
        work_dir: cli.work_dir,
    })?;
    Ok(())
}
