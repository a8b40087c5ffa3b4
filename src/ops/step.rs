//! Step parameters between consecutive pairs of a helix.

use super::fit::{Nucleotide, position_of};
use super::helix::{Helix, HelixPair};
use super::params::decompose;
use super::select::SelectedPair;
use crate::model::frame::Frame;
use crate::utils::parallel::*;
use serde::Serialize;

/// Rigid-body relationship between two stacked pairs.
///
/// Translations in ångströms, rotations in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepParameters {
    /// Index of the helix in the analysis output.
    pub helix: usize,
    /// Selected-pair indices of the lower and upper pair.
    pub from: usize,
    pub to: usize,
    pub shift: f64,
    pub slide: f64,
    pub rise: f64,
    pub tilt: f64,
    pub roll: f64,
    pub twist: f64,
}

/// Computes step parameters from the reference-strand frames of each helix.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepParameterCalculator;

impl StepParameterCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Steps between consecutive pairs of one helix.
    ///
    /// Each pair is represented by the frame of its reference-strand residue, as chosen by
    /// the pair's swap flag. Nothing is computed across helix boundaries.
    ///
    /// # Arguments
    ///
    /// * `helix_index` - Index reported in [`StepParameters::helix`].
    /// * `helix` - Helix whose pairs are visited in order.
    /// * `pairs` - Selected pairs referenced by the helix.
    /// * `nucleotides` - Fitted residues sorted by ordinal.
    pub fn compute_steps(
        &self,
        helix_index: usize,
        helix: &Helix,
        pairs: &[SelectedPair],
        nucleotides: &[Nucleotide<'_>],
    ) -> Vec<StepParameters> {
        helix
            .pairs
            .windows(2)
            .filter_map(|window| {
                let lower = representative_frame(&window[0], pairs, nucleotides)?;
                let upper = representative_frame(&window[1], pairs, nucleotides)?;
                let parts = decompose(&lower, &upper);
                Some(StepParameters {
                    helix: helix_index,
                    from: window[0].pair_index,
                    to: window[1].pair_index,
                    shift: parts.translation.x,
                    slide: parts.translation.y,
                    rise: parts.translation.z,
                    tilt: parts.rotation.x,
                    roll: parts.rotation.y,
                    twist: parts.rotation.z,
                })
            })
            .collect()
    }

    /// Steps of every helix, computed per helix in parallel and returned in helix order.
    pub fn compute_all(
        &self,
        helices: &[Helix],
        pairs: &[SelectedPair],
        nucleotides: &[Nucleotide<'_>],
    ) -> Vec<StepParameters> {
        let per_helix: Vec<Vec<StepParameters>> = helices
            .par_iter()
            .enumerate()
            .map(|(index, helix)| self.compute_steps(index, helix, pairs, nucleotides))
            .collect();
        per_helix.into_iter().flatten().collect()
    }
}

fn representative_frame(
    entry: &HelixPair,
    pairs: &[SelectedPair],
    nucleotides: &[Nucleotide<'_>],
) -> Option<Frame> {
    let pair = pairs.get(entry.pair_index)?;
    let ordinal = if entry.swapped { pair.second } else { pair.first };
    nucleotides
        .get(position_of(nucleotides, ordinal)?)
        .map(|n| n.frame)
}
