use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

mod commands;

use commands::IoParameters;
use commands::{helices, pairs};

#[derive(Parser, Debug)]
#[command(
    name = "hforge",
    about = "A command-line tool for identifying base pairs, assembling helices, and computing step parameters in nucleic-acid structures.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Input PDB file path. When omitted, stdin is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    input: Option<PathBuf>,
    /// Output file path. When omitted, stdout is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,
    /// TOML file overriding the default pairing thresholds.
    #[arg(long, value_name = "TOML", global = true)]
    config: Option<PathBuf>,
    /// Emit JSON instead of text tables.
    #[arg(long, global = true)]
    json: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the selected base pairs.
    Pairs(pairs::PairsArgs),
    /// Assemble helices and report step parameters.
    Helices(helices::HelicesArgs),
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let io_params = IoParameters {
        input: cli.input.clone(),
        output: cli.output.clone(),
        json: cli.json,
    };
    let config = commands::load_config(cli.config.as_deref())?;
    let structure = commands::load_input(&io_params)?;

    match cli.command {
        Command::Pairs(args) => pairs::run(&structure, &config, &args, &io_params)?,
        Command::Helices(args) => helices::run(&structure, &config, &args, &io_params)?,
    }

    Ok(())
}
