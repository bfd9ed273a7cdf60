//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Plan and simulate magnetic-bead protocols
#[derive(Parser, Debug)]
#[command(author, about, version)]
pub struct Cli {
    /// Log more (repeat for trace output); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a protocol against the simulator
    Run(RunArgs),
    /// Validate a run config and write its binary form
    Compile(CompileArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Run config, TOML or compiled
    pub config: PathBuf,

    /// Print every issued operation after the run
    #[arg(long)]
    pub print_plan: bool,

    /// Sleep through waits, scaled by this factor (1.0 = real time)
    #[arg(long, value_name = "FACTOR")]
    pub realtime_scale: Option<f64>,
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// TOML run config
    pub config: PathBuf,
    /// Output path for the compiled config
    pub out: PathBuf,
}
