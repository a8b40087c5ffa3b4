//! End-to-end analysis of one structure.

use super::config::PairingConfig;
use super::error::Error;
use super::fit::{FrameFitter, Nucleotide};
use super::helix::{Helix, HelixChainBuilder};
use super::select::{PairSelector, SelectedPair};
use super::step::{StepParameterCalculator, StepParameters};
use crate::model::structure::Structure;
use serde::Serialize;

/// Everything the pipeline derives from a structure.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis<'a> {
    /// Residues that received a base frame, sorted by ordinal.
    pub nucleotides: Vec<Nucleotide<'a>>,
    pub pairs: Vec<SelectedPair>,
    /// Helices referencing `pairs` by index.
    pub helices: Vec<Helix>,
    /// Steps of every helix, in helix order.
    pub steps: Vec<StepParameters>,
}

impl Analysis<'_> {
    /// Number of helices with more than one pair.
    pub fn stacked_helix_count(&self) -> usize {
        self.helices.iter().filter(|h| h.len() > 1).count()
    }
}

/// Runs frame fitting, pair selection, helix assembly, and step computation.
///
/// Empty results are not errors: a structure without nucleotides yields an analysis with
/// empty collections.
///
/// # Arguments
///
/// * `structure` - Structure to analyze; it is never modified.
/// * `config` - Thresholds for every stage.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] when `config` fails validation and
/// [`Error::EmptyResidue`] when a residue carries no atoms.
///
/// # Examples
///
/// ```
/// use helix_forge::ops::{PairType, PairingConfig, analyze};
/// use helix_forge::{Atom, BaseLetter, Chain, Frame, Residue, ResidueCategory, Structure, templates};
///
/// fn placed(letter: BaseLetter, name: &str, id: i32, frame: &Frame) -> Residue {
///     let template = templates::get(letter).unwrap();
///     let mut residue = Residue::new(id, None, name, ResidueCategory::Polymer);
///     for (atom, element, pos) in template.atoms() {
///         residue.add_atom(Atom::new(atom, element, frame.to_world(&pos)));
///     }
///     residue
/// }
///
/// let mut chain = Chain::new("A");
/// chain.add_residue(placed(BaseLetter::G, "DG", 1, &Frame::identity()));
/// chain.add_residue(placed(BaseLetter::C, "DC", 2, &Frame::identity().flipped()));
/// let mut structure = Structure::new();
/// structure.add_chain(chain);
///
/// let analysis = analyze(&structure, &PairingConfig::default()).unwrap();
/// assert_eq!(analysis.pairs.len(), 1);
/// assert_eq!(analysis.pairs[0].pair_type, PairType::WatsonCrick);
/// assert_eq!(analysis.helices.len(), 1);
/// assert!(analysis.steps.is_empty());
/// ```
pub fn analyze<'a>(structure: &'a Structure, config: &PairingConfig) -> Result<Analysis<'a>, Error> {
    config.validate()?;

    let nucleotides = FrameFitter::new(config).fit_structure(structure)?;
    let pairs = PairSelector::new(config).select(&nucleotides);
    let helices = HelixChainBuilder::new(config).organize(&nucleotides, &pairs);
    let steps = StepParameterCalculator::new().compute_all(&helices, &pairs, &nucleotides);

    log::info!(
        "analysis complete: {} pairs in {} helices, {} steps",
        pairs.len(),
        helices.len(),
        steps.len()
    );

    Ok(Analysis {
        nucleotides,
        pairs,
        helices,
        steps,
    })
}
