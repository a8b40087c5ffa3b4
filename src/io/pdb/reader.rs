use crate::db;
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    chain::Chain,
    residue::Residue,
    structure::Structure,
    types::{Element, Point, ResidueCategory},
};
use std::collections::HashMap;
use std::io::BufRead;
use std::ops::Range;
use std::str::FromStr;

const SOLVENT_NAMES: [&str; 3] = ["HOH", "WAT", "DOD"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResKey {
    res_seq: i32,
    i_code: Option<char>,
}

struct TempResidue {
    key: ResKey,
    raw_name: String,
    is_hetatm: bool,
    atoms: Vec<(f64, Atom)>,
}

#[derive(Default)]
struct TempChain {
    residues: Vec<TempResidue>,
    index: HashMap<ResKey, usize>,
}

/// Reads ATOM/HETATM records of the first model into a [`Structure`].
///
/// Chains and residues keep the order in which they first appear. Alternate locations are
/// resolved per atom name by keeping the highest occupancy; on ties the first record wins.
///
/// # Errors
///
/// Returns [`Error::Io`] when the reader fails and [`Error::Parse`] for truncated records or
/// unreadable numeric fields.
pub fn read<R: BufRead>(reader: R) -> Result<Structure, Error> {
    let mut chain_order: Vec<String> = Vec::new();
    let mut chain_map: HashMap<String, TempChain> = HashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line_num = index + 1;
        let line = line?;

        if line.starts_with("ENDMDL") {
            break;
        }

        let is_atom = line.starts_with("ATOM  ");
        let is_hetatm = line.starts_with("HETATM");

        if is_atom || is_hetatm {
            parse_atom_record(&line, line_num, is_hetatm, &mut chain_order, &mut chain_map)?;
        }
    }

    let mut structure = Structure::new();
    for chain_id in chain_order {
        let Some(temp_chain) = chain_map.remove(&chain_id) else {
            continue;
        };
        let mut chain = Chain::new(&chain_id);

        for temp_res in temp_chain.residues {
            let category = determine_category(temp_res.is_hetatm, &temp_res.raw_name);
            let mut residue = Residue::new(
                temp_res.key.res_seq,
                temp_res.key.i_code,
                &temp_res.raw_name,
                category,
            );
            for (_, atom) in temp_res.atoms {
                residue.add_atom(atom);
            }
            chain.add_residue(residue);
        }
        structure.add_chain(chain);
    }

    log::debug!(
        "read {} residues in {} chains",
        structure.residue_count(),
        structure.chain_count()
    );

    Ok(structure)
}

fn field(line: &str, range: Range<usize>) -> &str {
    let end = range.end.min(line.len());
    line.get(range.start.min(end)..end).unwrap_or("")
}

fn column(line: &str, index: usize) -> Option<char> {
    field(line, index..index + 1)
        .chars()
        .next()
        .filter(|c| *c != ' ')
}

fn parse_atom_record(
    line: &str,
    line_num: usize,
    is_hetatm: bool,
    chain_order: &mut Vec<String>,
    chain_map: &mut HashMap<String, TempChain>,
) -> Result<(), Error> {
    if line.len() < 54 {
        return Err(Error::parse(line_num, "atom record too short"));
    }

    let atom_name = normalize_atom_name(field(line, 12..16));
    let res_name = field(line, 17..20).trim().to_string();
    let chain_id = column(line, 21).map(String::from).unwrap_or_default();
    let i_code = column(line, 26);

    let res_seq = field(line, 22..26)
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::parse(line_num, "invalid residue sequence number"))?;

    let coordinate = |range: Range<usize>, axis: &str| {
        field(line, range)
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::parse(line_num, format!("invalid {axis} coordinate")))
    };
    let pos = Point::new(
        coordinate(30..38, "X")?,
        coordinate(38..46, "Y")?,
        coordinate(46..54, "Z")?,
    );

    let occupancy = field(line, 54..60).trim().parse::<f64>().unwrap_or(1.0);

    let element_str = field(line, 76..78).trim();
    let element = if element_str.is_empty() {
        parse_element_from_name(&atom_name)
    } else {
        Element::from_str(element_str).unwrap_or(Element::Unknown)
    };

    if !chain_map.contains_key(&chain_id) {
        chain_order.push(chain_id.clone());
    }
    let chain = chain_map.entry(chain_id).or_default();

    let key = ResKey { res_seq, i_code };
    let slot = match chain.index.get(&key) {
        Some(&slot) => slot,
        None => {
            chain.index.insert(key.clone(), chain.residues.len());
            chain.residues.push(TempResidue {
                key,
                raw_name: res_name,
                is_hetatm,
                atoms: Vec::new(),
            });
            chain.residues.len() - 1
        }
    };
    let temp_res = &mut chain.residues[slot];

    let atom = Atom::new(&atom_name, element, pos);
    match temp_res.atoms.iter_mut().find(|(_, a)| a.name.as_str() == atom_name) {
        Some(existing) => {
            if occupancy > existing.0 {
                *existing = (occupancy, atom);
            }
        }
        None => temp_res.atoms.push((occupancy, atom)),
    }

    Ok(())
}

/// Trims the name and replaces the legacy `*` sugar prime with `'`.
fn normalize_atom_name(raw: &str) -> String {
    raw.trim().replace('*', "'")
}

fn parse_element_from_name(name: &str) -> Element {
    let symbol: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_alphabetic())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    if let Ok(el) = Element::from_str(&symbol) {
        return el;
    }
    symbol
        .get(0..1)
        .and_then(|first| Element::from_str(first).ok())
        .unwrap_or(Element::Unknown)
}

fn determine_category(is_hetatm: bool, res_name: &str) -> ResidueCategory {
    if SOLVENT_NAMES.contains(&res_name) {
        ResidueCategory::Solvent
    } else if !is_hetatm || db::lookup_residue(res_name).is_some() {
        ResidueCategory::Polymer
    } else {
        ResidueCategory::Hetero
    }
}
