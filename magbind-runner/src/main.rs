//! magbind runner
//!
//! Loads a run config, plays the protocol against the simulated handler and
//! deck, and reports the issued operations. `compile` validates a TOML
//! config and stores it in the compact binary form.

mod cli;
mod config;
mod realtime;
mod run;

use clap::Parser;
use eyre::{eyre, Result};
use tracing::info;
use tracing::level_filters::LevelFilter;

use crate::cli::{Cli, Command, CompileArgs, RunArgs};

/// Install the subscriber; `log` records from the core crates are bridged in
fn init_logger(verbose: u8) {
    let filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(filter.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .unwrap_or_else(|e| {
            eprintln!("failed to init logger: {}", e);
        });
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Run(args) => run_protocol(args),
        Command::Compile(args) => compile(args),
    }
}

fn run_protocol(args: RunArgs) -> Result<()> {
    let config = config::load(&args.config)?;
    let outcome = run::execute(&config, args.realtime_scale)?;

    if args.print_plan {
        for (i, op) in outcome.ops.iter().enumerate() {
            println!("{:5}  {}", i + 1, op);
        }
    }

    info!(
        ops = outcome.ops.len(),
        tips_single = outcome.tips_single,
        tips_multi = outcome.tips_multi,
        pauses = outcome.pauses,
        waited_s = outcome.waited.as_secs(),
        phase = ?outcome.phase,
        "Run finished"
    );

    outcome
        .result
        .map_err(|e| eyre!("{} failed: {}", config.protocol, e))
}

fn compile(args: CompileArgs) -> Result<()> {
    let config = config::compile(&args.config, &args.out)?;
    info!("Compiled {} config to {}", config.protocol, args.out.display());
    Ok(())
}
