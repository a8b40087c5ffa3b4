//! Geometric admissibility of a candidate base pair.
//!
//! The checks run cheapest first. Origin distance, vertical offset, plane angle, and
//! glycosidic-atom separation are pure frame arithmetic; the projected ring overlap is only
//! computed once those four pass. Hydrogen-bond counting is left to the pair selector, which
//! runs the assigner only for geometrically valid candidates.

use super::config::{GEOMETRY_EPSILON, PairingConfig};
use super::fit::Nucleotide;
use super::hbond::HydrogenBond;
use super::overlap;
use super::params::{BasePairParameters, angle_between};
use crate::model::types::Point;
use nalgebra::Vector3;
use serde::Serialize;

/// Glycosidic distance reported when either base lacks its glycosidic atom.
pub const MISSING_DNN: f64 = 1.0e6;

/// Classification of an accepted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairType {
    WatsonCrick,
    Wobble,
    Unclassified,
}

impl PairType {
    pub fn name(&self) -> &'static str {
        match self {
            PairType::WatsonCrick => "Watson-Crick",
            PairType::Wobble => "Wobble",
            PairType::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for PairType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw geometric descriptors of a base pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairDescriptors {
    /// Distance between the two frame origins.
    pub dorg: f64,
    /// Origin offset along the averaged normal.
    pub d_v: f64,
    /// Angle between the base normals, folded into [0°, 90°].
    pub plane_angle: f64,
    /// Distance between the glycosidic atoms, or [`MISSING_DNN`].
    pub dnn: f64,
    /// Projected ring overlap; `None` when an earlier check already failed.
    pub overlap_area: Option<f64>,
    /// Cosines between corresponding axes of the two frames.
    pub dir_x: f64,
    pub dir_y: f64,
    pub dir_z: f64,
}

/// Outcome of each admissibility check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairChecks {
    pub dorg: bool,
    pub d_v: bool,
    pub plane_angle: bool,
    pub dnn: bool,
    pub overlap: bool,
    pub hbonds: bool,
}

impl PairChecks {
    /// All frame-only checks passed; the hydrogen-bond assigner may run.
    pub fn geometry_ok(&self) -> bool {
        self.dorg && self.d_v && self.plane_angle && self.dnn && self.overlap
    }

    pub fn is_valid(&self) -> bool {
        self.geometry_ok() && self.hbonds
    }
}

/// An evaluated pair of nucleotides, identified by residue ordinal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCandidate {
    pub first: usize,
    pub second: usize,
    pub descriptors: PairDescriptors,
    pub checks: PairChecks,
    pub bonds: Vec<HydrogenBond>,
    pub parameters: Option<BasePairParameters>,
    pub pair_type: PairType,
    /// Lower is better.
    pub score: f64,
}

impl PairCandidate {
    pub fn is_valid(&self) -> bool {
        self.checks.is_valid()
    }

    /// Ordinal of the residue on the other side of the pair.
    pub fn partner_of(&self, ordinal: usize) -> Option<usize> {
        if ordinal == self.first {
            Some(self.second)
        } else if ordinal == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

/// Computes pair descriptors and runs the geometric checks.
#[derive(Debug, Clone, Copy)]
pub struct PairGeometryValidator<'c> {
    config: &'c PairingConfig,
}

impl<'c> PairGeometryValidator<'c> {
    pub fn new(config: &'c PairingConfig) -> Self {
        Self { config }
    }

    /// Evaluates the geometric admissibility of two fitted nucleotides.
    ///
    /// The returned candidate has `checks.hbonds == false` and no bonds; the pair selector
    /// fills those in for candidates whose geometry passes.
    ///
    /// # Arguments
    ///
    /// * `first` / `second` - Nucleotides in ordinal order.
    pub fn validate(&self, first: &Nucleotide<'_>, second: &Nucleotide<'_>) -> PairCandidate {
        let cfg = self.config;
        let fa = &first.frame;
        let fb = &second.frame;

        let dorg = nalgebra::distance(&fa.origin, &fb.origin);
        let zave = averaged_normal(&fa.z(), &fb.z());
        let d_v = (fb.origin - fa.origin).dot(&zave).abs();

        let angle = angle_between(&fa.z(), &fb.z()).to_degrees();
        let plane_angle = if angle > 90.0 { 180.0 - angle } else { angle };

        let dnn = glycosidic_distance(first, second);

        let mut checks = PairChecks {
            dorg: PairingConfig::within(dorg, cfg.min_dorg, cfg.max_dorg),
            d_v: PairingConfig::within(d_v, cfg.min_dv, cfg.max_dv),
            plane_angle: PairingConfig::within(
                plane_angle,
                cfg.min_plane_angle,
                cfg.max_plane_angle,
            ),
            dnn: dnn >= cfg.min_dnn - GEOMETRY_EPSILON,
            overlap: false,
            hbonds: false,
        };

        let overlap_area = if checks.dorg && checks.d_v && checks.plane_angle && checks.dnn {
            let outline_a = overlap::base_outline(first.residue, first.base.template());
            let outline_b = overlap::base_outline(second.residue, second.base.template());
            let center = Point::from((fa.origin.coords + fb.origin.coords) / 2.0);
            let area = overlap::overlap_area(&outline_a, &outline_b, &center, &zave);
            checks.overlap = area < cfg.max_overlap_area;
            Some(area)
        } else {
            None
        };

        PairCandidate {
            first: first.ordinal,
            second: second.ordinal,
            descriptors: PairDescriptors {
                dorg,
                d_v,
                plane_angle,
                dnn,
                overlap_area,
                dir_x: fa.x().dot(&fb.x()),
                dir_y: fa.y().dot(&fb.y()),
                dir_z: fa.z().dot(&fb.z()),
            },
            checks,
            bonds: Vec::new(),
            parameters: None,
            pair_type: PairType::Unclassified,
            score: dorg + 2.0 * d_v + plane_angle / 20.0,
        }
    }
}

/// Normalized sum of the two normals when they agree, normalized difference otherwise.
pub(crate) fn averaged_normal(z1: &Vector3<f64>, z2: &Vector3<f64>) -> Vector3<f64> {
    let combined = if z1.dot(z2) > 0.0 { z1 + z2 } else { z2 - z1 };
    if combined.norm() == 0.0 {
        *z1
    } else {
        combined.normalize()
    }
}

fn glycosidic_distance(first: &Nucleotide<'_>, second: &Nucleotide<'_>) -> f64 {
    let atom_a = first.residue.atom(first.base.template().glycosidic_atom());
    let atom_b = second.residue.atom(second.base.template().glycosidic_atom());
    match (atom_a, atom_b) {
        (Some(a), Some(b)) => a.distance(b),
        _ => MISSING_DNN,
    }
}
