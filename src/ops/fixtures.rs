//! Synthetic nucleotides built from the embedded templates.

use super::config::PairingConfig;
use super::fit::{FrameFitter, Nucleotide};
use crate::db;
use crate::model::atom::Atom;
use crate::model::frame::Frame;
use crate::model::key::ResidueKey;
use crate::model::residue::Residue;
use crate::model::types::{BaseLetter, ResidueCategory};
use nalgebra::Vector3;

pub(crate) fn dna_name(letter: BaseLetter) -> &'static str {
    match letter {
        BaseLetter::A => "DA",
        BaseLetter::C => "DC",
        BaseLetter::G => "DG",
        BaseLetter::T => "DT",
        BaseLetter::U => "U",
        BaseLetter::I => "DI",
    }
}

/// Places every template atom of `letter` through `frame`.
pub(crate) fn base_residue(letter: BaseLetter, name: &str, id: i32, frame: &Frame) -> Residue {
    let template = db::get_template(letter).expect("template exists");
    let mut residue = Residue::new(id, None, name, ResidueCategory::Polymer);
    for (atom_name, element, pos) in template.atoms() {
        residue.add_atom(Atom::new(atom_name, element, frame.to_world(&pos)));
    }
    residue
}

/// Fits `residue` with the default configuration and tags it with `ordinal`.
pub(crate) fn nucleotide(residue: &Residue, ordinal: usize) -> Nucleotide<'_> {
    let config = PairingConfig::default();
    let fitted = FrameFitter::new(&config).fit(residue).expect("residue fits");
    Nucleotide {
        ordinal,
        key: ResidueKey::new("A", &residue.name, residue.id, residue.insertion_code),
        residue,
        base: fitted.base,
        frame: fitted.frame,
    }
}

pub(crate) fn translated(residue: &Residue, offset: Vector3<f64>) -> Residue {
    let mut moved = Residue::new(
        residue.id,
        residue.insertion_code,
        &residue.name,
        residue.category,
    );
    for atom in residue.iter_atoms() {
        moved.add_atom(Atom::new(&atom.name, atom.element, atom.pos + offset));
    }
    moved
}
