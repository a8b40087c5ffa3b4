use std::fs::{self, File};
use std::io::{self as stdio, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

use helix_forge::Structure;
use helix_forge::io::read_pdb_structure;
use helix_forge::ops::{Analysis, PairingConfig, analyze};

pub mod helices;
pub mod pairs;

/// Aggregated IO parameters shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct IoParameters {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Loads a PDB structure from the configured input source.
pub fn load_input(params: &IoParameters) -> Result<Structure> {
    let structure = if let Some(path) = &params.input {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        read_pdb_structure(BufReader::new(file))
            .with_context(|| format!("Failed to parse PDB input from {}", path.display()))?
    } else {
        let stdin = stdio::stdin();
        if stdin.is_terminal() {
            bail!(
                "No --input provided and stdin is a TTY. Provide -i/--input or pipe a structure into hforge."
            );
        }
        read_pdb_structure(BufReader::new(stdin.lock()))
            .context("Failed to parse PDB input from stdin")?
    };

    Ok(structure)
}

/// Reads pairing thresholds from a TOML file, falling back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<PairingConfig> {
    let Some(path) = path else {
        return Ok(PairingConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    let config = PairingConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Runs the full analysis under a spinner.
pub fn analyze_with_spinner<'a>(
    structure: &'a Structure,
    config: &PairingConfig,
) -> Result<Analysis<'a>> {
    run_with_spinner("Analyzing base pairs", || {
        analyze(structure, config).context("Analysis failed")
    })
}

/// Hands a buffered writer for the configured destination to `emit`.
pub fn write_output<F>(params: &IoParameters, emit: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    match &params.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            emit(&mut writer)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            writer.flush().context("Failed to flush output writer")?;
        }
        None => {
            let stdout = stdio::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            emit(&mut writer).context("Failed to write report to stdout")?;
            writer.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

/// Wraps long-running operations with a spinner rendered to stderr.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work();

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}

pub fn print_boxed_label(writer: &mut dyn Write, title: &str) -> stdio::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}
