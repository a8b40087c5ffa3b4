//! Deserializable representations of the base templates and the residue registry.
//!
//! The schema matches the TOML documents in `templates/` and is only used when the template
//! store is first touched. All structs deny unknown fields so a typo in the template corpus
//! fails fast instead of silently dropping data.

use crate::model::types::{BaseFamily, BaseLetter, Element, Hybridization};
use serde::Deserialize;

/// A single base template: metadata, idealized coordinates, overlap outline, and polar atoms.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BaseTemplateFile {
    pub info: TemplateInfo,
    pub ring: TemplateRing,
    /// Heavy atoms of the base plus C1', in the idealized base frame.
    pub atoms: Vec<TemplateAtom>,
    /// Exocyclic atoms standing in for ring atoms in the overlap outline.
    #[serde(default)]
    pub substituents: Vec<TemplateSubstituent>,
    /// Atoms able to donate or accept base-base hydrogen bonds.
    #[serde(default)]
    pub polar: Vec<TemplatePolarAtom>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateInfo {
    /// Template identifier (matches the file name).
    pub name: String,
    pub letter: BaseLetter,
    pub family: BaseFamily,
    /// Atom carrying the glycosidic bond (N9 for purines, N1 for pyrimidines).
    pub glycosidic: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateRing {
    /// Ring atoms in perimeter order; these are also the fitting reference points.
    pub perimeter: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateAtom {
    pub name: String,
    pub element: Element,
    /// Coordinates (Å) in the base reference frame.
    pub pos: [f64; 3],
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateSubstituent {
    /// Ring atom the substituent is bonded to.
    pub ring: String,
    pub atom: String,
    /// Alternative spellings found in older coordinate files.
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplatePolarAtom {
    pub name: String,
    pub hybridization: Hybridization,
    /// Number of attached hydrogens at neutral pH.
    pub hydrogens: u8,
}

/// Residue-name registry document.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RegistryFile {
    pub residues: Vec<RegistryEntry>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RegistryEntry {
    /// Residue name as written in coordinate files.
    pub name: String,
    /// Template whose ring atoms the residue is fitted against.
    pub parent: BaseLetter,
    #[serde(default)]
    pub modified: bool,
}
