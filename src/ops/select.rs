//! Candidate evaluation and mutual-best base-pair selection.
//!
//! Evaluation enumerates nucleotide pairs whose frame origins lie within the coarse cutoff,
//! validates their geometry, runs the hydrogen-bond assigner for the survivors, and
//! classifies every valid candidate. Evaluation is embarrassingly parallel. Selection then
//! commits pairs whose two residues rank each other as best partner, repeating until no
//! mutual-best pair remains. Selection runs on one thread in ascending ordinal order so the
//! outcome never depends on scheduling.

use super::config::PairingConfig;
use super::fit::{Nucleotide, position_of};
use super::hbond::{HydrogenBond, HydrogenBondAssigner};
use super::params::{BasePairParameters, base_pair_parameters};
use super::validate::{PairCandidate, PairDescriptors, PairGeometryValidator, PairType};
use crate::model::grid::Grid;
use crate::model::key::ResidueKey;
use crate::model::types::BaseLetter;
use crate::utils::parallel::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Score adjustment applied to Watson-Crick pairs.
pub const WATSON_CRICK_BONUS: f64 = -2.0;

const MAX_STRETCH: f64 = 2.0;
const MAX_OPENING: f64 = 60.0;
const WOBBLE_SHEAR: (f64, f64) = (1.8, 2.8);

/// Assigns a pair type from base-pair parameters and base letters.
///
/// # Arguments
///
/// * `first` / `second` - Parent base letters of the two residues.
/// * `params` - Parameters of the pair, computed with `first` as reference.
pub fn classify(first: BaseLetter, second: BaseLetter, params: &BasePairParameters) -> PairType {
    let shear = params.shear.abs();
    if params.stretch.abs() > MAX_STRETCH || params.opening.abs() > MAX_OPENING {
        PairType::Unclassified
    } else if (WOBBLE_SHEAR.0..=WOBBLE_SHEAR.1).contains(&shear) {
        PairType::Wobble
    } else if shear <= WOBBLE_SHEAR.0 && first.is_complementary(second) {
        PairType::WatsonCrick
    } else {
        PairType::Unclassified
    }
}

/// Valid candidates indexed by the residues they involve.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<PairCandidate>,
    by_residue: BTreeMap<usize, Vec<usize>>,
    evaluated: usize,
}

impl CandidateSet {
    /// Builds a set from already evaluated candidates, keeping only the valid ones.
    pub fn from_candidates(candidates: impl IntoIterator<Item = PairCandidate>) -> Self {
        let mut set = Self::default();
        for candidate in candidates {
            set.evaluated += 1;
            if !candidate.is_valid() {
                continue;
            }
            let index = set.candidates.len();
            set.by_residue.entry(candidate.first).or_default().push(index);
            set.by_residue.entry(candidate.second).or_default().push(index);
            set.candidates.push(candidate);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of pairs that were evaluated, valid or not.
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn get(&self, index: usize) -> Option<&PairCandidate> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PairCandidate> {
        self.candidates.iter()
    }

    /// Indices of the candidates involving the residue with the given ordinal.
    pub fn for_residue(&self, ordinal: usize) -> &[usize] {
        self.by_residue
            .get(&ordinal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Per-residue state during selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Unmatched,
    Matched { partner: usize },
}

/// A committed base pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedPair {
    /// Ordinal of the residue that comes first in the structure.
    pub first: usize,
    pub second: usize,
    pub first_key: ResidueKey,
    pub second_key: ResidueKey,
    pub bases: (BaseLetter, BaseLetter),
    pub descriptors: PairDescriptors,
    pub parameters: BasePairParameters,
    pub pair_type: PairType,
    /// Quality score including the Watson-Crick bonus; lower is better.
    pub score: f64,
    pub bonds: Vec<HydrogenBond>,
}

impl SelectedPair {
    pub fn contains(&self, ordinal: usize) -> bool {
        self.first == ordinal || self.second == ordinal
    }
}

/// Evaluates candidates and selects the final, strictly one-to-one base pairs.
#[derive(Debug, Clone, Copy)]
pub struct PairSelector<'c> {
    config: &'c PairingConfig,
}

impl<'c> PairSelector<'c> {
    pub fn new(config: &'c PairingConfig) -> Self {
        Self { config }
    }

    /// Evaluates and selects base pairs among fitted nucleotides.
    ///
    /// # Arguments
    ///
    /// * `nucleotides` - Fitted residues sorted by ordinal.
    ///
    /// # Returns
    ///
    /// Selected pairs sorted by the ordinal of their first residue; empty when nothing pairs.
    pub fn select(&self, nucleotides: &[Nucleotide<'_>]) -> Vec<SelectedPair> {
        let candidates = self.evaluate(nucleotides);
        self.select_from(nucleotides, &candidates)
    }

    /// Validates every nucleotide pair within the coarse cutoff.
    pub fn evaluate(&self, nucleotides: &[Nucleotide<'_>]) -> CandidateSet {
        let grid = Grid::new(
            nucleotides
                .iter()
                .enumerate()
                .map(|(index, n)| (n.frame.origin, index)),
            self.config.coarse_cutoff,
        );

        let mut work: Vec<(usize, usize)> = Vec::new();
        for (i, nucleotide) in nucleotides.iter().enumerate() {
            let mut near: Vec<usize> = grid
                .within(&nucleotide.frame.origin, self.config.coarse_cutoff)
                .into_iter()
                .map(|(_, &j)| j)
                .filter(|&j| j > i)
                .collect();
            near.sort_unstable();
            work.extend(near.into_iter().map(|j| (i, j)));
        }

        let validator = PairGeometryValidator::new(self.config);
        let assigner = HydrogenBondAssigner::new(self.config);

        let evaluated: Vec<PairCandidate> = work
            .par_iter()
            .map(|&(i, j)| evaluate_pair(&validator, &assigner, self.config, &nucleotides[i], &nucleotides[j]))
            .collect();

        let set = CandidateSet::from_candidates(evaluated);
        log::info!(
            "{} of {} candidate pairs passed validation",
            set.len(),
            set.evaluated()
        );
        set
    }

    /// Runs mutual-best matching over pre-evaluated candidates.
    ///
    /// Each unmatched residue points at its lowest-scoring candidate whose partner is still
    /// unmatched, ties going to the lower partner ordinal. Every round commits all pairs whose
    /// residues point at each other, then refreshes only the residues whose choice became
    /// unavailable.
    pub fn select_from(
        &self,
        nucleotides: &[Nucleotide<'_>],
        candidates: &CandidateSet,
    ) -> Vec<SelectedPair> {
        let mut state: BTreeMap<usize, MatchState> = nucleotides
            .iter()
            .map(|n| (n.ordinal, MatchState::Unmatched))
            .collect();
        let mut best: BTreeMap<usize, Option<usize>> = state
            .keys()
            .map(|&ordinal| (ordinal, best_candidate(candidates, &state, ordinal)))
            .collect();
        let mut committed: Vec<usize> = Vec::new();

        loop {
            let accepted: Vec<usize> = best
                .iter()
                .filter_map(|(&ordinal, &choice)| {
                    let index = choice?;
                    let partner = candidates.get(index)?.partner_of(ordinal)?;
                    (ordinal < partner && best.get(&partner) == Some(&Some(index)))
                        .then_some(index)
                })
                .collect();
            if accepted.is_empty() {
                break;
            }

            for &index in &accepted {
                let Some(candidate) = candidates.get(index) else {
                    continue;
                };
                state.insert(
                    candidate.first,
                    MatchState::Matched {
                        partner: candidate.second,
                    },
                );
                state.insert(
                    candidate.second,
                    MatchState::Matched {
                        partner: candidate.first,
                    },
                );
                best.remove(&candidate.first);
                best.remove(&candidate.second);
            }
            committed.extend(accepted);

            let stale: Vec<usize> = best
                .iter()
                .filter(|(ordinal, choice)| {
                    choice
                        .and_then(|index| candidates.get(index))
                        .and_then(|c| c.partner_of(**ordinal))
                        .is_some_and(|partner| state.get(&partner) != Some(&MatchState::Unmatched))
                })
                .map(|(&ordinal, _)| ordinal)
                .collect();
            for ordinal in stale {
                best.insert(ordinal, best_candidate(candidates, &state, ordinal));
            }
        }

        let mut pairs: Vec<SelectedPair> = committed
            .into_iter()
            .filter_map(|index| {
                let candidate = candidates.get(index)?;
                let a = &nucleotides[position_of(nucleotides, candidate.first)?];
                let b = &nucleotides[position_of(nucleotides, candidate.second)?];
                Some(SelectedPair {
                    first: candidate.first,
                    second: candidate.second,
                    first_key: a.key.clone(),
                    second_key: b.key.clone(),
                    bases: (a.base.letter, b.base.letter),
                    descriptors: candidate.descriptors,
                    parameters: candidate.parameters?,
                    pair_type: candidate.pair_type,
                    score: candidate.score,
                    bonds: candidate.bonds.clone(),
                })
            })
            .collect();
        pairs.sort_by_key(|p| p.first);

        log::info!("selected {} base pairs", pairs.len());
        pairs
    }
}

fn evaluate_pair(
    validator: &PairGeometryValidator<'_>,
    assigner: &HydrogenBondAssigner<'_>,
    config: &PairingConfig,
    first: &Nucleotide<'_>,
    second: &Nucleotide<'_>,
) -> PairCandidate {
    let mut candidate = validator.validate(first, second);
    if !candidate.checks.geometry_ok() {
        log::trace!("{} / {}: rejected by geometry {:?}", first.key, second.key, candidate.checks);
        return candidate;
    }

    let assignment = assigner.resolve_with_templates(
        first.residue,
        Some(first.base.template()),
        second.residue,
        Some(second.base.template()),
    );
    candidate.checks.hbonds = assignment.is_valid(config.min_hbonds);
    candidate.bonds = assignment.bonds;
    if !candidate.checks.hbonds {
        log::trace!("{} / {}: too few hydrogen bonds", first.key, second.key);
        return candidate;
    }

    let parameters = base_pair_parameters(&first.frame, &second.frame);
    candidate.pair_type = classify(first.base.letter, second.base.letter, &parameters);
    candidate.parameters = Some(parameters);
    if candidate.pair_type == PairType::WatsonCrick {
        candidate.score += WATSON_CRICK_BONUS;
    }
    candidate
}

fn best_candidate(
    candidates: &CandidateSet,
    state: &BTreeMap<usize, MatchState>,
    ordinal: usize,
) -> Option<usize> {
    candidates
        .for_residue(ordinal)
        .iter()
        .filter_map(|&index| {
            let candidate = candidates.get(index)?;
            let partner = candidate.partner_of(ordinal)?;
            (state.get(&partner) == Some(&MatchState::Unmatched))
                .then_some((index, partner, candidate.score))
        })
        .min_by(|a, b| {
            a.2.total_cmp(&b.2)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.0.cmp(&b.0))
        })
        .map(|(index, _, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::frame::Frame;
    use crate::model::residue::Residue;
    use crate::ops::fixtures::{self, nucleotide};
    use crate::ops::validate::PairChecks;
    use nalgebra::Vector3;

    fn params(shear: f64, stretch: f64, opening: f64) -> BasePairParameters {
        BasePairParameters {
            shear,
            stretch,
            stagger: 0.0,
            buckle: 0.0,
            propeller: 0.0,
            opening,
        }
    }

    fn synthetic(first: usize, second: usize, score: f64) -> PairCandidate {
        PairCandidate {
            first,
            second,
            descriptors: PairDescriptors {
                dorg: score,
                d_v: 0.0,
                plane_angle: 0.0,
                dnn: 9.0,
                overlap_area: Some(0.0),
                dir_x: 1.0,
                dir_y: -1.0,
                dir_z: -1.0,
            },
            checks: PairChecks {
                dorg: true,
                d_v: true,
                plane_angle: true,
                dnn: true,
                overlap: true,
                hbonds: true,
            },
            bonds: Vec::new(),
            parameters: Some(params(0.0, 0.0, 0.0)),
            pair_type: PairType::Unclassified,
            score,
        }
    }

    fn scattered_residues(count: usize) -> Vec<Residue> {
        (0..count)
            .map(|i| {
                let mut frame = Frame::identity();
                frame.origin = nalgebra::Point3::new(40.0 * i as f64, 0.0, 0.0);
                fixtures::base_residue(BaseLetter::A, "DA", i as i32 + 1, &frame)
            })
            .collect()
    }

    #[test]
    fn classify_watson_crick_wobble_and_unclassified() {
        let wc = params(0.1, 0.05, 2.0);
        assert_eq!(classify(BaseLetter::G, BaseLetter::C, &wc), PairType::WatsonCrick);
        assert_eq!(classify(BaseLetter::A, BaseLetter::U, &wc), PairType::WatsonCrick);
        assert_eq!(classify(BaseLetter::G, BaseLetter::A, &wc), PairType::Unclassified);

        let wobble = params(-2.2, 0.1, -5.0);
        assert_eq!(classify(BaseLetter::G, BaseLetter::U, &wobble), PairType::Wobble);

        let stretched = params(0.0, 2.5, 0.0);
        assert_eq!(classify(BaseLetter::G, BaseLetter::C, &stretched), PairType::Unclassified);

        let opened = params(0.0, 0.0, 75.0);
        assert_eq!(classify(BaseLetter::A, BaseLetter::T, &opened), PairType::Unclassified);

        let sheared = params(3.5, 0.0, 0.0);
        assert_eq!(classify(BaseLetter::A, BaseLetter::T, &sheared), PairType::Unclassified);
    }

    #[test]
    fn ideal_pair_is_selected_as_watson_crick() {
        let config = PairingConfig::default();
        let frame = Frame::identity();
        let g = fixtures::base_residue(BaseLetter::G, "DG", 1, &frame);
        let c = fixtures::base_residue(BaseLetter::C, "DC", 2, &frame.flipped());
        let nucleotides = vec![nucleotide(&g, 0), nucleotide(&c, 1)];

        let pairs = PairSelector::new(&config).select(&nucleotides);

        assert_eq!(pairs.len(), 1);
        let pair = &pairs[0];
        assert_eq!((pair.first, pair.second), (0, 1));
        assert_eq!(pair.pair_type, PairType::WatsonCrick);
        assert_eq!(pair.bases, (BaseLetter::G, BaseLetter::C));
        assert_eq!(pair.bonds.len(), 3);
        assert!((pair.score - WATSON_CRICK_BONUS).abs() < 1e-6);
        assert!(pair.parameters.shear.abs() < 1e-6);
        assert!(pair.parameters.opening.abs() < 1e-6);
    }

    #[test]
    fn stacked_and_distant_residues_are_not_paired() {
        let config = PairingConfig::default();
        let a = fixtures::base_residue(BaseLetter::A, "DA", 1, &Frame::identity());
        let stacked = fixtures::translated(&a, Vector3::new(0.0, 0.0, 3.4));
        let far = fixtures::translated(&a, Vector3::new(60.0, 0.0, 0.0));
        let nucleotides = vec![nucleotide(&a, 0), nucleotide(&stacked, 1), nucleotide(&far, 2)];

        let selector = PairSelector::new(&config);
        let candidates = selector.evaluate(&nucleotides);

        assert_eq!(candidates.evaluated(), 1);
        assert!(candidates.is_empty());
        assert!(selector.select_from(&nucleotides, &candidates).is_empty());
    }

    #[test]
    fn mutual_best_refreshes_residues_that_lost_their_partner() {
        let config = PairingConfig::default();
        let residues = scattered_residues(4);
        let nucleotides: Vec<Nucleotide<'_>> = residues
            .iter()
            .enumerate()
            .map(|(i, r)| nucleotide(r, i))
            .collect();
        let candidates = CandidateSet::from_candidates(vec![
            synthetic(0, 1, 1.0),
            synthetic(1, 2, 0.5),
            synthetic(2, 3, 0.7),
            synthetic(0, 3, 2.0),
        ]);

        let pairs = PairSelector::new(&config).select_from(&nucleotides, &candidates);

        let chosen: Vec<(usize, usize)> = pairs.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(chosen, vec![(0, 3), (1, 2)]);
    }

    #[test]
    fn equal_scores_prefer_lower_partner_ordinal() {
        let config = PairingConfig::default();
        let residues = scattered_residues(3);
        let nucleotides: Vec<Nucleotide<'_>> = residues
            .iter()
            .enumerate()
            .map(|(i, r)| nucleotide(r, i))
            .collect();
        let candidates = CandidateSet::from_candidates(vec![
            synthetic(0, 2, 1.0),
            synthetic(0, 1, 1.0),
        ]);

        let pairs = PairSelector::new(&config).select_from(&nucleotides, &candidates);

        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].first, pairs[0].second), (0, 1));
    }

    #[test]
    fn selecting_twice_from_one_candidate_set_gives_identical_pairs() {
        let config = PairingConfig::default();
        let frame = Frame::identity();
        let g = fixtures::base_residue(BaseLetter::G, "DG", 1, &frame);
        let c = fixtures::base_residue(BaseLetter::C, "DC", 2, &frame.flipped());
        let shift = Vector3::new(40.0, 0.0, 0.0);
        let a = fixtures::translated(&fixtures::base_residue(BaseLetter::A, "DA", 3, &frame), shift);
        let t = fixtures::translated(
            &fixtures::base_residue(BaseLetter::T, "DT", 4, &frame.flipped()),
            shift,
        );
        let lone = fixtures::translated(&g, Vector3::new(80.0, 0.0, 0.0));
        let residues = [g, c, a, t, lone];
        let nucleotides: Vec<Nucleotide<'_>> = residues
            .iter()
            .enumerate()
            .map(|(i, r)| nucleotide(r, i))
            .collect();

        let selector = PairSelector::new(&config);
        let candidates = selector.evaluate(&nucleotides);
        let first_run = selector.select_from(&nucleotides, &candidates);
        let second_run = selector.select_from(&nucleotides, &candidates);

        assert_eq!(first_run.len(), 2);
        assert_eq!(first_run, second_run);
        let chosen: Vec<(usize, usize)> = first_run.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(chosen, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn candidate_set_drops_invalid_candidates() {
        let mut invalid = synthetic(0, 1, 1.0);
        invalid.checks.hbonds = false;
        let set = CandidateSet::from_candidates(vec![invalid, synthetic(1, 2, 1.0)]);

        assert_eq!(set.evaluated(), 2);
        assert_eq!(set.len(), 1);
        assert!(set.for_residue(0).is_empty());
        assert_eq!(set.for_residue(2), &[0]);
    }
}
