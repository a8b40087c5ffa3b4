//! Helix assembly from selected base pairs.
//!
//! Two pairs are stacked neighbors when a residue of one is backbone-linked to a residue of
//! the other (an O3' atom within the join distance of a P atom) and their centers lie within
//! the helix break distance. Chains are walked from the endpoints of this neighbor graph and
//! stop at the first endpoint-like pair, so a junction never merges two helices.
//!
//! Each pair in a chain then receives a strand-swap flag choosing which of its residues lies
//! on the reference strand. The flag comes from the direction of the backbone link to the
//! preceding pair when one exists, then from y-axis alignment for canonical pairs, then from
//! z-axis alignment. A whole-helix vote over the full linkage evidence finally corrects pairs
//! that disagree with the majority and reverses helices that were walked 3'→5'.

use super::config::PairingConfig;
use super::fit::{Nucleotide, position_of};
use super::select::SelectedPair;
use super::validate::PairType;
use crate::model::frame::Frame;
use crate::model::grid::Grid;
use crate::model::types::Point;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Minimum y-axis alignment difference for the canonical-pair heuristic to decide.
const Y_ALIGNMENT_MARGIN: f64 = 0.1;

const PHOSPHORUS: &str = "P";
const LINK_OXYGEN: &str = "O3'";

/// Number of stacked neighbors of a pair, interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackboneContext {
    Isolated,
    Terminal,
    Interior,
    Junction,
}

impl BackboneContext {
    pub fn from_degree(degree: usize) -> Self {
        match degree {
            0 => BackboneContext::Isolated,
            1 => BackboneContext::Terminal,
            2 => BackboneContext::Interior,
            _ => BackboneContext::Junction,
        }
    }

    /// Chains stop when they reach a pair that is not interior.
    pub fn is_endpoint_like(&self) -> bool {
        !matches!(self, BackboneContext::Interior)
    }
}

/// A pair's place in a helix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HelixPair {
    /// Index into the selected-pair list.
    pub pair_index: usize,
    /// `true` when the pair's second residue lies on the reference strand.
    pub swapped: bool,
}

/// An ordered run of stacked base pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Helix {
    pub pairs: Vec<HelixPair>,
    /// Set when the orientation vote was decided by at most one pair.
    pub ambiguous_orientation: bool,
}

impl Helix {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HelixPair> {
        self.pairs.iter()
    }
}

/// Directed O3'→P links between residues, keyed by residue ordinal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackboneLinks {
    links: BTreeSet<(usize, usize)>,
}

impl BackboneLinks {
    pub fn contains(&self, from: usize, to: usize) -> bool {
        self.links.contains(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.links.iter().copied()
    }
}

struct PairSite {
    first: usize,
    second: usize,
    first_frame: Frame,
    second_frame: Frame,
    center: Point,
    pair_type: PairType,
}

impl PairSite {
    fn residues(&self) -> [usize; 2] {
        [self.first, self.second]
    }

    fn reference_frame(&self, swapped: bool) -> &Frame {
        if swapped {
            &self.second_frame
        } else {
            &self.first_frame
        }
    }
}

/// Organizes selected pairs into helices with resolved strand orientation.
#[derive(Debug, Clone, Copy)]
pub struct HelixChainBuilder<'c> {
    config: &'c PairingConfig,
}

impl<'c> HelixChainBuilder<'c> {
    pub fn new(config: &'c PairingConfig) -> Self {
        Self { config }
    }

    /// Groups pairs into helices.
    ///
    /// Every selected pair appears in exactly one helix; a pair without stacked neighbors
    /// forms a helix of its own.
    ///
    /// # Arguments
    ///
    /// * `nucleotides` - Fitted residues sorted by ordinal.
    /// * `pairs` - Selected pairs, as returned by the pair selector.
    pub fn organize(&self, nucleotides: &[Nucleotide<'_>], pairs: &[SelectedPair]) -> Vec<Helix> {
        let sites: Vec<PairSite> = pairs
            .iter()
            .filter_map(|pair| {
                let a = nucleotides.get(position_of(nucleotides, pair.first)?)?;
                let b = nucleotides.get(position_of(nucleotides, pair.second)?)?;
                Some(PairSite {
                    first: pair.first,
                    second: pair.second,
                    first_frame: a.frame,
                    second_frame: b.frame,
                    center: Point::from((a.frame.origin.coords + b.frame.origin.coords) / 2.0),
                    pair_type: pair.pair_type,
                })
            })
            .collect();
        if sites.len() != pairs.len() {
            log::warn!("{} selected pairs refer to unfitted residues", pairs.len() - sites.len());
            return Vec::new();
        }

        let links = self.backbone_links(nucleotides);
        let neighbors = self.neighbors(&sites, &links);
        let chains = walk_chains(&neighbors);

        let helices: Vec<Helix> = chains
            .into_iter()
            .map(|chain| orient(&chain, &sites, &links))
            .collect();

        log::info!(
            "organized {} pairs into {} helices",
            pairs.len(),
            helices.len()
        );
        helices
    }

    /// Finds every residue whose O3' atom lies within the join distance of another
    /// residue's P atom.
    pub fn backbone_links(&self, nucleotides: &[Nucleotide<'_>]) -> BackboneLinks {
        let join = self.config.backbone_join_distance;
        let grid = Grid::new(
            nucleotides.iter().flat_map(|n| {
                n.residue
                    .iter_atoms()
                    .filter(|a| a.name == PHOSPHORUS)
                    .map(move |a| (a.pos, n.ordinal))
            }),
            join,
        );

        let mut links = BTreeSet::new();
        for nucleotide in nucleotides {
            for oxygen in nucleotide.residue.iter_atoms().filter(|a| a.name == LINK_OXYGEN) {
                for (_, &target) in grid.within(&oxygen.pos, join) {
                    if target != nucleotide.ordinal {
                        links.insert((nucleotide.ordinal, target));
                    }
                }
            }
        }

        log::debug!("found {} backbone links", links.len());
        BackboneLinks { links }
    }

    /// Sorted stacked-neighbor lists, one per pair.
    fn neighbors(&self, sites: &[PairSite], links: &BackboneLinks) -> Vec<Vec<usize>> {
        let mut pair_of = BTreeMap::new();
        for (index, site) in sites.iter().enumerate() {
            pair_of.insert(site.first, index);
            pair_of.insert(site.second, index);
        }

        let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
        for (from, to) in links.iter() {
            let (Some(&p), Some(&q)) = (pair_of.get(&from), pair_of.get(&to)) else {
                continue;
            };
            if p == q {
                continue;
            }
            let distance = nalgebra::distance(&sites[p].center, &sites[q].center);
            if PairingConfig::within(distance, 0.0, self.config.helix_break_distance) {
                edges.insert((p.min(q), p.max(q)));
            } else {
                log::debug!("backbone link between pairs {p} and {q} spans {distance:.2} Å, treated as a break");
            }
        }

        if self.config.stack_without_backbone {
            let grid = Grid::new(
                sites.iter().enumerate().map(|(i, s)| (s.center, i)),
                self.config.stack_distance,
            );
            for (p, site) in sites.iter().enumerate() {
                for (_, &q) in grid.within(&site.center, self.config.stack_distance) {
                    if q > p {
                        edges.insert((p, q));
                    }
                }
            }
        }

        let mut neighbors = vec![Vec::new(); sites.len()];
        for (p, q) in edges {
            neighbors[p].push(q);
            neighbors[q].push(p);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }
        neighbors
    }
}

/// Splits the neighbor graph into chains.
///
/// Walks start at endpoint-like pairs in ascending index, always stepping to the lowest
/// unvisited neighbor and stopping after the first endpoint-like pair. Pairs left over form
/// closed loops and are walked from their lowest index.
fn walk_chains(neighbors: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let context = |p: usize| BackboneContext::from_degree(neighbors[p].len());
    let mut visited = vec![false; neighbors.len()];
    let mut chains = Vec::new();

    let walk = |start: usize, visited: &mut Vec<bool>| -> Vec<usize> {
        let mut chain = vec![start];
        visited[start] = true;
        let mut current = start;
        while let Some(&next) = neighbors[current].iter().find(|&&n| !visited[n]) {
            visited[next] = true;
            chain.push(next);
            if context(next).is_endpoint_like() {
                break;
            }
            current = next;
        }
        chain
    };

    for start in 0..neighbors.len() {
        if !visited[start] && context(start).is_endpoint_like() {
            chains.push(walk(start, &mut visited));
        }
    }
    for start in 0..neighbors.len() {
        if !visited[start] {
            chains.push(walk(start, &mut visited));
        }
    }

    chains
}

/// Linkage evidence that `site.first` lies on a strand running towards `other`.
///
/// `other_is_later` tells whether `other` follows `site` in chain order. A first-residue
/// link pointing at `other`, or a second-residue link arriving from it, votes for running
/// forward; links in the opposite directions vote against.
fn link_evidence(
    site: &PairSite,
    other: &PairSite,
    other_is_later: bool,
    links: &BackboneLinks,
) -> i32 {
    let toward = if other_is_later { 1 } else { -1 };
    let mut evidence = 0;
    for x in other.residues() {
        if links.contains(site.first, x) {
            evidence += toward;
        }
        if links.contains(x, site.first) {
            evidence -= toward;
        }
        if links.contains(site.second, x) {
            evidence -= toward;
        }
        if links.contains(x, site.second) {
            evidence += toward;
        }
    }
    evidence
}

fn orient(chain: &[usize], sites: &[PairSite], links: &BackboneLinks) -> Helix {
    let n = chain.len();
    let site = |k: usize| &sites[chain[k]];

    // Walk-time decision from the link to the preceding pair (the following one for the
    // first pair).
    let mut swapped: Vec<Option<bool>> = (0..n)
        .map(|k| {
            let evidence = if k > 0 {
                link_evidence(site(k), site(k - 1), false, links)
            } else if n > 1 {
                link_evidence(site(0), site(1), true, links)
            } else {
                0
            };
            match evidence.signum() {
                1 => Some(false),
                -1 => Some(true),
                _ => None,
            }
        })
        .collect();

    for k in 0..n {
        if swapped[k].is_some() {
            continue;
        }
        let anchor = (0..k)
            .rev()
            .find(|&m| swapped[m].is_some())
            .or_else(|| (k + 1..n).find(|&m| swapped[m].is_some()));
        swapped[k] = Some(match anchor {
            Some(m) => {
                let reference = site(m).reference_frame(swapped[m].unwrap_or(false));
                frame_alignment_choice(site(k), reference)
            }
            None => false,
        });
    }
    let mut swapped: Vec<bool> = swapped.into_iter().map(|s| s.unwrap_or(false)).collect();

    let evidence: Vec<i32> = (0..n)
        .map(|k| {
            let mut total = 0;
            if k > 0 {
                total += link_evidence(site(k), site(k - 1), false, links);
            }
            if k + 1 < n {
                total += link_evidence(site(k), site(k + 1), true, links);
            }
            total
        })
        .collect();

    let outcome = vote(&mut swapped, &evidence);
    if outcome.ambiguous {
        log::debug!(
            "helix starting at pair {} has a thin orientation majority",
            chain[0]
        );
    }

    let mut pairs: Vec<HelixPair> = chain
        .iter()
        .zip(swapped)
        .map(|(&pair_index, swapped)| HelixPair {
            pair_index,
            swapped,
        })
        .collect();
    if outcome.reverse {
        pairs.reverse();
    }

    Helix {
        pairs,
        ambiguous_orientation: outcome.ambiguous,
    }
}

/// Chooses the reference residue of a pair without linkage evidence, relative to the
/// reference frame of an already oriented neighbor.
fn frame_alignment_choice(site: &PairSite, reference: &Frame) -> bool {
    if matches!(site.pair_type, PairType::WatsonCrick | PairType::Wobble) {
        let first = site.first_frame.y().dot(&reference.y());
        let second = site.second_frame.y().dot(&reference.y());
        if (first - second).abs() > Y_ALIGNMENT_MARGIN {
            return second > first;
        }
    }
    let first = site.first_frame.z().dot(&reference.z());
    let second = site.second_frame.z().dot(&reference.z());
    second > first
}

struct VoteOutcome {
    reverse: bool,
    ambiguous: bool,
}

/// Majority vote over per-pair direction signals.
///
/// A pair's signal is the sign of its linkage evidence, negated when the pair is swapped,
/// so `+1` means its reference strand runs along the chain order. Pairs against the majority
/// are flipped; a negative majority asks for the pair order to be reversed.
fn vote(swapped: &mut [bool], evidence: &[i32]) -> VoteOutcome {
    let signals: Vec<i32> = swapped
        .iter()
        .zip(evidence)
        .map(|(&s, &e)| if s { -e.signum() } else { e.signum() })
        .collect();
    let positive = signals.iter().filter(|&&s| s > 0).count();
    let negative = signals.iter().filter(|&&s| s < 0).count();
    let ambiguous = positive > 0 && negative > 0 && positive.abs_diff(negative) <= 1;

    let majority = (positive as i64 - negative as i64).signum() as i32;
    if majority != 0 {
        for (flag, &signal) in swapped.iter_mut().zip(&signals) {
            if signal == -majority {
                *flag = !*flag;
            }
        }
    }

    VoteOutcome {
        reverse: majority < 0,
        ambiguous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_from_degree() {
        assert_eq!(BackboneContext::from_degree(0), BackboneContext::Isolated);
        assert_eq!(BackboneContext::from_degree(1), BackboneContext::Terminal);
        assert_eq!(BackboneContext::from_degree(2), BackboneContext::Interior);
        assert_eq!(BackboneContext::from_degree(4), BackboneContext::Junction);
        assert!(!BackboneContext::Interior.is_endpoint_like());
    }

    #[test]
    fn chain_walk_stops_at_junctions() {
        // 0 - 1 - 2 with a branch 1 - 3.
        let neighbors = vec![vec![1], vec![0, 2, 3], vec![1], vec![1]];
        let chains = walk_chains(&neighbors);
        assert_eq!(chains, vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn chain_walk_covers_closed_loops() {
        let neighbors = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        let chains = walk_chains(&neighbors);
        assert_eq!(chains, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn vote_flips_minority_pairs() {
        let mut swapped = vec![false, false, false, false];
        let outcome = vote(&mut swapped, &[2, 2, -2, 1]);
        assert_eq!(swapped, vec![false, false, true, false]);
        assert!(!outcome.reverse);
        assert!(!outcome.ambiguous);
    }

    #[test]
    fn vote_reverses_negative_majority_and_flags_thin_margins() {
        let mut swapped = vec![false, false, false];
        let outcome = vote(&mut swapped, &[-1, -2, 1]);
        assert!(outcome.reverse);
        assert!(outcome.ambiguous);
        assert_eq!(swapped, vec![false, false, true]);
    }

    #[test]
    fn vote_without_evidence_keeps_flags() {
        let mut swapped = vec![true, false];
        let outcome = vote(&mut swapped, &[0, 0]);
        assert_eq!(swapped, vec![true, false]);
        assert!(!outcome.reverse);
        assert!(!outcome.ambiguous);
    }
}
