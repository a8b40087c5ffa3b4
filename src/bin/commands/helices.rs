use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};
use serde::Serialize;

use helix_forge::Structure;
use helix_forge::ops::{Helix, PairingConfig, SelectedPair, StepParameters};

use crate::commands::{IoParameters, analyze_with_spinner, print_boxed_label, write_output};

/// Assembles helices and reports their step parameters.
#[derive(Debug, Default, Args)]
pub struct HelicesArgs {
    /// Omit single-pair helices from the report.
    #[arg(long)]
    pub stacked_only: bool,
}

#[derive(Serialize)]
struct HelicesReport<'a> {
    pairs: &'a [SelectedPair],
    helices: Vec<IndexedHelix<'a>>,
    steps: &'a [StepParameters],
}

#[derive(Serialize)]
struct IndexedHelix<'a> {
    index: usize,
    #[serde(flatten)]
    helix: &'a Helix,
}

pub fn run(
    structure: &Structure,
    config: &PairingConfig,
    args: &HelicesArgs,
    params: &IoParameters,
) -> Result<()> {
    let analysis = analyze_with_spinner(structure, config)?;

    let helices: Vec<IndexedHelix<'_>> = analysis
        .helices
        .iter()
        .enumerate()
        .filter(|(_, helix)| !args.stacked_only || helix.len() > 1)
        .map(|(index, helix)| IndexedHelix { index, helix })
        .collect();

    write_output(params, |writer| {
        if params.json {
            let report = HelicesReport {
                pairs: &analysis.pairs,
                helices,
                steps: &analysis.steps,
            };
            serde_json::to_writer_pretty(&mut *writer, &report)
                .context("Failed to serialize helices")?;
            writeln!(writer)?;
            return Ok(());
        }

        print_helix_table(writer, &helices, &analysis.pairs)?;
        writeln!(writer)?;
        print_step_table(writer, &analysis.steps)?;
        Ok(())
    })
}

fn print_helix_table(
    writer: &mut dyn Write,
    helices: &[IndexedHelix<'_>],
    pairs: &[SelectedPair],
) -> Result<()> {
    print_boxed_label(writer, &format!("Helices ({})", helices.len()))?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["Helix", "Pairs", "Reference Strand", "Ambiguous"]);
    for entry in helices {
        let strand: Vec<String> = entry
            .helix
            .iter()
            .filter_map(|hp| {
                let pair = pairs.get(hp.pair_index)?;
                let (reference, partner) = if hp.swapped {
                    (&pair.second_key, &pair.first_key)
                } else {
                    (&pair.first_key, &pair.second_key)
                };
                Some(format!("{reference}-{partner}"))
            })
            .collect();
        table.add_row(row![
            entry.index,
            entry.helix.len(),
            strand.join(" "),
            if entry.helix.ambiguous_orientation { "yes" } else { "no" }
        ]);
    }
    table
        .print(writer)
        .context("Failed to render helix table")?;
    Ok(())
}

fn print_step_table(writer: &mut dyn Write, steps: &[StepParameters]) -> Result<()> {
    print_boxed_label(writer, &format!("Step Parameters ({})", steps.len()))?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row![
        "Helix", "Step", "Shift", "Slide", "Rise", "Tilt", "Roll", "Twist"
    ]);
    for step in steps {
        table.add_row(row![
            step.helix,
            format!("{}→{}", step.from, step.to),
            format!("{:.2}", step.shift),
            format!("{:.2}", step.slide),
            format!("{:.2}", step.rise),
            format!("{:.2}", step.tilt),
            format!("{:.2}", step.roll),
            format!("{:.2}", step.twist)
        ]);
    }
    table
        .print(writer)
        .context("Failed to render step table")?;
    Ok(())
}
