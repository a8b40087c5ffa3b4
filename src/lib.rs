//! # HelixForge
//!
//! **HelixForge** is a pure-Rust engine for finding base pairs in nucleic-acid structures, assembling the pairs into helices, and reporting the rigid-body step parameters between stacked pairs. Results are deterministic: the same structure and configuration always produce the same pairs, helices, and orientation flags, with or without parallel evaluation.
//!
//! ## Features
//!
//! - **Template-based base frames** – Embedded TOML templates for A, C, G, T, U, and I plus a data-only registry of modified nucleotides give every base a least-squares reference frame.
//! - **Geometric pair validation** – Origin distance, vertical offset, plane angle, glycosidic separation, and projected ring overlap screen candidates before any hydrogen bond is assigned.
//! - **Capacity-aware hydrogen bonds** – Donor and acceptor capacities, slot geometry, and a deterministic contact order decide which polar contacts count.
//! - **Strict one-to-one pairing** – Mutual-best matching over quality scores, with a fixed tie-break, commits each residue to at most one partner.
//! - **Helix assembly and steps** – Backbone linkage and pair proximity order pairs into helices, a strand-orientation vote fixes the reference strand, and step parameters follow from the base frames.
//! - **Ergonomic structure model** – Lightweight `Atom`, `Residue`, `Chain`, and `Structure` types backed by `nalgebra`, with a buffered PDB reader under `io`.

mod db;
mod model;

pub mod io;
pub mod ops;
pub mod templates;

mod utils;

pub use model::atom::Atom;
pub use model::chain::Chain;
pub use model::frame::Frame;
pub use model::grid::Grid;
pub use model::key::ResidueKey;
pub use model::residue::Residue;
pub use model::structure::Structure;
pub use model::types::{BaseFamily, BaseLetter, Element, Hybridization, Point, ResidueCategory};
