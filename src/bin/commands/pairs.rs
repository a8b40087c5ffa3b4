use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};
use serde::Serialize;

use helix_forge::Structure;
use helix_forge::ops::{BondAtom, PairSide, PairingConfig, SelectedPair};

use crate::commands::{IoParameters, analyze_with_spinner, print_boxed_label, write_output};

/// Lists the selected base pairs.
#[derive(Debug, Default, Args)]
pub struct PairsArgs {
    /// Also list the hydrogen bonds committed for each pair.
    #[arg(long)]
    pub bonds: bool,
}

#[derive(Serialize)]
struct PairsReport<'a> {
    nucleotides: usize,
    pairs: &'a [SelectedPair],
}

pub fn run(
    structure: &Structure,
    config: &PairingConfig,
    args: &PairsArgs,
    params: &IoParameters,
) -> Result<()> {
    let analysis = analyze_with_spinner(structure, config)?;

    write_output(params, |writer| {
        if params.json {
            let report = PairsReport {
                nucleotides: analysis.nucleotides.len(),
                pairs: &analysis.pairs,
            };
            serde_json::to_writer_pretty(&mut *writer, &report)
                .context("Failed to serialize pairs")?;
            writeln!(writer)?;
            return Ok(());
        }

        print_pair_table(writer, &analysis.pairs)?;
        if args.bonds {
            writeln!(writer)?;
            print_bond_table(writer, &analysis.pairs)?;
        }
        Ok(())
    })
}

fn print_pair_table(writer: &mut dyn Write, pairs: &[SelectedPair]) -> Result<()> {
    print_boxed_label(writer, &format!("Base Pairs ({})", pairs.len()))?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row![
        "#", "Residue 1", "Residue 2", "Bases", "Type", "Score", "dorg (Å)", "d_v (Å)",
        "Angle (°)", "H-Bonds"
    ]);
    for (index, pair) in pairs.iter().enumerate() {
        table.add_row(row![
            index,
            pair.first_key,
            pair.second_key,
            format!("{}-{}", pair.bases.0.as_char(), pair.bases.1.as_char()),
            pair.pair_type,
            format!("{:.2}", pair.score),
            format!("{:.2}", pair.descriptors.dorg),
            format!("{:.2}", pair.descriptors.d_v),
            format!("{:.1}", pair.descriptors.plane_angle),
            pair.bonds.len()
        ]);
    }
    table
        .print(writer)
        .context("Failed to render pair table")?;
    Ok(())
}

fn print_bond_table(writer: &mut dyn Write, pairs: &[SelectedPair]) -> Result<()> {
    print_boxed_label(writer, "Hydrogen Bonds")?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["Pair", "Donor", "Acceptor", "Distance (Å)", "Standard"]);
    for (index, pair) in pairs.iter().enumerate() {
        for bond in &pair.bonds {
            table.add_row(row![
                index,
                bond_atom_label(pair, &bond.donor),
                bond_atom_label(pair, &bond.acceptor),
                format!("{:.2}", bond.distance),
                if bond.standard { "yes" } else { "no" }
            ]);
        }
    }
    table
        .print(writer)
        .context("Failed to render bond table")?;
    Ok(())
}

fn bond_atom_label(pair: &SelectedPair, atom: &BondAtom) -> String {
    let key = match atom.side {
        PairSide::First => &pair.first_key,
        PairSide::Second => &pair.second_key,
    };
    format!("{key}:{}", atom.name)
}
