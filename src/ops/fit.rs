//! Base reference-frame fitting.
//!
//! Each residue is matched to an idealized base template by atom name and superposed onto it
//! with a least-squares (Kabsch) fit. The fitted rotation supplies the frame axes and the
//! template's reference point, carried through the fit, supplies the origin. Residue names
//! are resolved through the template registry first; names the registry does not know fall
//! back to detecting the parent base from the ring and exocyclic atoms present.

use super::config::{GEOMETRY_EPSILON, PairingConfig};
use super::error::Error;
use crate::db::{self, TemplateView};
use crate::model::frame::Frame;
use crate::model::key::ResidueKey;
use crate::model::residue::Residue;
use crate::model::structure::Structure;
use crate::model::types::{BaseFamily, BaseLetter, Point};
use crate::utils::parallel::*;
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;
use thiserror::Error;

/// Minimum number of named ring atoms needed for a well-posed fit.
const MIN_MATCHED_ATOMS: usize = 3;

/// Relative singular-value floor below which the reference points are treated as collinear.
const RANK_TOLERANCE: f64 = 1e-6;

/// Ring atoms found only in purines.
const PURINE_MARKERS: [&str; 3] = ["N7", "C8", "N9"];

/// Ring atoms shared by purines and pyrimidines.
const SHARED_RING_ATOMS: [&str; 6] = ["N1", "C2", "N3", "C4", "C5", "C6"];

/// Why a residue did not receive a base frame.
///
/// Fit failures exclude the residue from pairing but never abort the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FitFailure {
    /// The residue is solvent, has no template, or carries too few ring atoms to be a base.
    #[error("residue is not a nucleotide")]
    NotNucleotide,
    /// A template was found but too few of its ring atoms are present.
    #[error("only {matched} template ring atoms present")]
    InsufficientAtoms { matched: usize },
    /// The best superposition deviates too much from the idealized base.
    #[error("base fit RMS {rms:.3} Å exceeds the accepted maximum")]
    PoorFit { rms: f64 },
    /// The matched atoms are collinear or the decomposition did not converge.
    #[error("degenerate reference geometry")]
    Degenerate,
}

/// Base identity assigned to a fitted residue.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BaseAssignment {
    pub letter: BaseLetter,
    pub family: BaseFamily,
    /// `true` for registered modified nucleotides and for auto-detected residues.
    pub modified: bool,
    #[serde(skip)]
    template: TemplateView<'static>,
}

impl BaseAssignment {
    fn new(template: TemplateView<'static>, modified: bool) -> Self {
        Self {
            letter: template.letter(),
            family: template.family(),
            modified,
            template,
        }
    }

    /// Template the residue was fitted against.
    pub fn template(&self) -> TemplateView<'static> {
        self.template
    }
}

/// Successful outcome of [`FrameFitter::fit`].
#[derive(Debug, Clone, Copy)]
pub struct FittedBase {
    pub base: BaseAssignment,
    pub frame: Frame,
}

/// A residue that received a base frame, tagged with its stable ordinal.
#[derive(Debug, Clone, Serialize)]
pub struct Nucleotide<'a> {
    /// Position of the residue in [`Structure::iter_residues_with_chain`].
    pub ordinal: usize,
    pub key: ResidueKey,
    #[serde(skip)]
    pub residue: &'a Residue,
    pub base: BaseAssignment,
    pub frame: Frame,
}

/// Locates a nucleotide by residue ordinal in an ordinal-sorted slice.
///
/// # Returns
///
/// The slice index of the nucleotide, or `None` when the ordinal has no frame.
pub fn position_of(nucleotides: &[Nucleotide<'_>], ordinal: usize) -> Option<usize> {
    nucleotides
        .binary_search_by_key(&ordinal, |n| n.ordinal)
        .ok()
}

/// Fits base reference frames against the embedded templates.
#[derive(Debug, Clone, Copy)]
pub struct FrameFitter<'c> {
    config: &'c PairingConfig,
}

struct Superposition {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    rms: f64,
}

impl<'c> FrameFitter<'c> {
    pub fn new(config: &'c PairingConfig) -> Self {
        Self { config }
    }

    /// Computes the base frame of a single residue.
    ///
    /// # Arguments
    ///
    /// * `residue` - Residue whose ring atoms are matched against a template by name.
    ///
    /// # Returns
    ///
    /// The fitted frame and base identity, or the reason no frame could be assigned.
    pub fn fit(&self, residue: &Residue) -> Result<FittedBase, FitFailure> {
        if residue.is_solvent() {
            return Err(FitFailure::NotNucleotide);
        }

        let fitted = match db::lookup_residue(&residue.name) {
            Some(registered) => {
                let template =
                    db::get_template(registered.parent).ok_or(FitFailure::NotNucleotide)?;
                let frame = self.frame_from_template(residue, template)?;
                FittedBase {
                    base: BaseAssignment::new(template, registered.modified),
                    frame,
                }
            }
            None => self.detect_and_fit(residue)?,
        };

        if fitted.frame.rms > self.config.max_fit_rms + GEOMETRY_EPSILON {
            return Err(FitFailure::PoorFit {
                rms: fitted.frame.rms,
            });
        }

        Ok(fitted)
    }

    /// Fits every residue of a structure, in ordinal order.
    ///
    /// Residues that fail to fit are logged at debug level and omitted from the result.
    ///
    /// # Arguments
    ///
    /// * `structure` - Structure whose residues are visited in ordinal order.
    ///
    /// # Returns
    ///
    /// Nucleotides sorted by ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyResidue`] when any residue has no atoms.
    pub fn fit_structure<'a>(&self, structure: &'a Structure) -> Result<Vec<Nucleotide<'a>>, Error> {
        let entries: Vec<(usize, ResidueKey, &'a Residue)> = structure
            .iter_residues_with_chain()
            .enumerate()
            .map(|(ordinal, (chain, residue))| {
                let key = ResidueKey::new(
                    &chain.id,
                    &residue.name,
                    residue.id,
                    residue.insertion_code,
                );
                (ordinal, key, residue)
            })
            .collect();

        if let Some((_, key, residue)) = entries.iter().find(|(_, _, r)| r.is_empty()) {
            let res_id = match residue.insertion_code {
                Some(code) => format!("{}{}", residue.id, code),
                None => residue.id.to_string(),
            };
            return Err(Error::empty_residue(key.chain_id.as_str(), res_id));
        }

        let fitted: Vec<Option<Nucleotide<'a>>> = entries
            .par_iter()
            .map(|(ordinal, key, residue)| match self.fit(residue) {
                Ok(FittedBase { base, frame }) => Some(Nucleotide {
                    ordinal: *ordinal,
                    key: key.clone(),
                    residue: *residue,
                    base,
                    frame,
                }),
                Err(failure) => {
                    if !residue.is_solvent() {
                        log::debug!("{key}: no base frame ({failure})");
                    }
                    None
                }
            })
            .collect();

        let nucleotides: Vec<Nucleotide<'a>> = fitted.into_iter().flatten().collect();
        log::info!(
            "fitted base frames for {} of {} residues",
            nucleotides.len(),
            entries.len()
        );
        Ok(nucleotides)
    }

    fn detect_and_fit(&self, residue: &Residue) -> Result<FittedBase, FitFailure> {
        let markers = PURINE_MARKERS
            .iter()
            .filter(|name| residue.has_atom(name))
            .count();
        let shared = SHARED_RING_ATOMS
            .iter()
            .filter(|name| residue.has_atom(name))
            .count();

        if markers + shared < MIN_MATCHED_ATOMS {
            return Err(FitFailure::NotNucleotide);
        }

        let candidates: Vec<BaseLetter> = match markers {
            0 => vec![pyrimidine_letter(residue)],
            1 => vec![purine_letter(residue), pyrimidine_letter(residue)],
            _ => vec![purine_letter(residue)],
        };

        let mut best: Option<FittedBase> = None;
        let mut last_failure = FitFailure::NotNucleotide;
        for letter in candidates {
            let Some(template) = db::get_template(letter) else {
                continue;
            };
            match self.frame_from_template(residue, template) {
                Ok(frame) => {
                    let better = best.is_none_or(|b| frame.rms < b.frame.rms);
                    if better {
                        best = Some(FittedBase {
                            base: BaseAssignment::new(template, true),
                            frame,
                        });
                    }
                }
                Err(failure) => last_failure = failure,
            }
        }

        match best {
            Some(fitted) => {
                log::debug!(
                    "residue '{}' not in registry, detected parent base {}",
                    residue.name.trim(),
                    fitted.base.letter
                );
                Ok(fitted)
            }
            None => Err(last_failure),
        }
    }

    fn frame_from_template(
        &self,
        residue: &Residue,
        template: TemplateView<'static>,
    ) -> Result<Frame, FitFailure> {
        let pairs: Vec<(Point, Point)> = template
            .ring_atoms()
            .filter_map(|(name, reference)| residue.atom(name).map(|atom| (atom.pos, reference)))
            .collect();

        if pairs.len() < MIN_MATCHED_ATOMS {
            return Err(FitFailure::InsufficientAtoms {
                matched: pairs.len(),
            });
        }

        let fit = superpose(&pairs).ok_or(FitFailure::Degenerate)?;
        Ok(Frame::new(Point::from(fit.translation), fit.rotation, fit.rms))
    }
}

fn purine_letter(residue: &Residue) -> BaseLetter {
    if residue.has_atom("O6") {
        if residue.has_atom("N2") {
            BaseLetter::G
        } else {
            BaseLetter::I
        }
    } else {
        BaseLetter::A
    }
}

fn pyrimidine_letter(residue: &Residue) -> BaseLetter {
    if residue.has_atom("N4") {
        BaseLetter::C
    } else if residue.has_atom("C7") || residue.has_atom("C5M") {
        BaseLetter::T
    } else if residue.has_atom("O4") {
        BaseLetter::U
    } else {
        BaseLetter::C
    }
}

/// Least-squares rigid superposition mapping template points onto experimental points.
///
/// `pairs` holds `(experimental, template)` tuples. The returned rotation and translation
/// satisfy `experimental ≈ rotation * template + translation`.
fn superpose(pairs: &[(Point, Point)]) -> Option<Superposition> {
    let n = pairs.len() as f64;
    let center_exp = pairs.iter().map(|p| p.0.coords).sum::<Vector3<f64>>() / n;
    let center_tmpl = pairs.iter().map(|p| p.1.coords).sum::<Vector3<f64>>() / n;

    let mut cov = Matrix3::zeros();
    for (p_exp, p_tmpl) in pairs {
        cov += (p_exp.coords - center_exp) * (p_tmpl.coords - center_tmpl).transpose();
    }

    let svd = cov.svd(true, true);
    let values = svd.singular_values;
    let largest = values.max();
    if !largest.is_finite() || largest <= 0.0 {
        return None;
    }
    let significant = values.iter().filter(|v| **v > largest * RANK_TOLERANCE).count();
    if significant < 2 {
        return None;
    }

    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut rotation = u * v_t;
    if rotation.determinant() < 0.0 {
        let weakest = values.imin();
        let mut correction = Matrix3::identity();
        correction[(weakest, weakest)] = -1.0;
        rotation = u * correction * v_t;
    }

    let translation = center_exp - rotation * center_tmpl;

    let sum_sq: f64 = pairs
        .iter()
        .map(|(p_exp, p_tmpl)| (rotation * p_tmpl.coords + translation - p_exp.coords).norm_squared())
        .sum();

    Some(Superposition {
        rotation,
        translation,
        rms: (sum_sq / n).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::chain::Chain;
    use crate::model::types::{Element, ResidueCategory};
    use crate::ops::fixtures;
    use nalgebra::Rotation3;

    fn tilted_frame() -> Frame {
        let rotation = Rotation3::from_euler_angles(0.3, -0.2, 1.1);
        Frame::new(Point::new(4.0, -3.0, 7.5), *rotation.matrix(), 0.0)
    }

    #[test]
    fn fit_recovers_placement_of_ideal_base() {
        let config = PairingConfig::default();
        let placement = tilted_frame();
        let residue = fixtures::base_residue(BaseLetter::G, "DG", 1, &placement);

        let fitted = FrameFitter::new(&config).fit(&residue).unwrap();

        assert_eq!(fitted.base.letter, BaseLetter::G);
        assert!(!fitted.base.modified);
        assert!(fitted.frame.rms < 1e-6);
        assert!((fitted.frame.origin - placement.origin).norm() < 1e-6);
        assert!((fitted.frame.rotation - placement.rotation).abs().max() < 1e-6);
        assert!(fitted.frame.is_orthonormal(1e-9));
    }

    #[test]
    fn fit_uses_registry_for_modified_names() {
        let config = PairingConfig::default();
        let residue = fixtures::base_residue(BaseLetter::U, "PSU", 4, &Frame::identity());

        let fitted = FrameFitter::new(&config).fit(&residue).unwrap();

        assert_eq!(fitted.base.letter, BaseLetter::U);
        assert!(fitted.base.modified);
        assert_eq!(fitted.base.template().name(), "U");
    }

    #[test]
    fn unknown_name_is_detected_from_atoms() {
        let config = PairingConfig::default();
        let cytosine = fixtures::base_residue(BaseLetter::C, "XYZ", 2, &tilted_frame());
        let adenine = fixtures::base_residue(BaseLetter::A, "QQA", 3, &tilted_frame());
        let fitter = FrameFitter::new(&config);

        let c = fitter.fit(&cytosine).unwrap();
        assert_eq!(c.base.letter, BaseLetter::C);
        assert!(c.base.modified);

        let a = fitter.fit(&adenine).unwrap();
        assert_eq!(a.base.letter, BaseLetter::A);
        assert_eq!(a.base.family, BaseFamily::Purine);
    }

    #[test]
    fn single_purine_marker_is_resolved_by_rms() {
        let config = PairingConfig::default();
        let mut residue = fixtures::base_residue(BaseLetter::U, "ZZU", 5, &Frame::identity());
        residue.add_atom(Atom::new("N7", Element::N, Point::new(40.0, 40.0, 40.0)));

        let fitted = FrameFitter::new(&config).fit(&residue).unwrap();
        assert_eq!(fitted.base.family, BaseFamily::Pyrimidine);
        assert_eq!(fitted.base.letter, BaseLetter::U);
    }

    #[test]
    fn too_few_ring_atoms_fail() {
        let config = PairingConfig::default();
        let mut residue = Residue::new(1, None, "DA", ResidueCategory::Polymer);
        residue.add_atom(Atom::new("N1", Element::N, Point::new(0.0, 0.0, 0.0)));
        residue.add_atom(Atom::new("C2", Element::C, Point::new(1.3, 0.0, 0.0)));
        residue.add_atom(Atom::new("P", Element::P, Point::new(5.0, 5.0, 0.0)));

        assert_eq!(
            FrameFitter::new(&config).fit(&residue).unwrap_err(),
            FitFailure::InsufficientAtoms { matched: 2 }
        );
    }

    #[test]
    fn non_nucleotides_fail_without_error() {
        let config = PairingConfig::default();
        let fitter = FrameFitter::new(&config);

        let mut alanine = Residue::new(1, None, "ALA", ResidueCategory::Polymer);
        alanine.add_atom(Atom::new("N", Element::N, Point::new(0.0, 0.0, 0.0)));
        alanine.add_atom(Atom::new("CA", Element::C, Point::new(1.46, 0.0, 0.0)));
        alanine.add_atom(Atom::new("C", Element::C, Point::new(2.0, 1.4, 0.0)));
        assert_eq!(fitter.fit(&alanine).unwrap_err(), FitFailure::NotNucleotide);

        let mut water = Residue::new(2, None, "HOH", ResidueCategory::Solvent);
        water.add_atom(Atom::new("O", Element::O, Point::origin()));
        assert_eq!(fitter.fit(&water).unwrap_err(), FitFailure::NotNucleotide);
    }

    #[test]
    fn distorted_base_is_a_poor_fit() {
        let config = PairingConfig::default();
        let mut residue = Residue::new(1, None, "C", ResidueCategory::Polymer);
        let template = db::get_template(BaseLetter::C).unwrap();
        for (name, element, pos) in template.atoms() {
            let bent = if name == "N3" || name == "C4" {
                Point::new(pos.x, pos.y, pos.z + 3.0)
            } else {
                pos
            };
            residue.add_atom(Atom::new(name, element, bent));
        }

        assert!(matches!(
            FrameFitter::new(&config).fit(&residue),
            Err(FitFailure::PoorFit { .. })
        ));
    }

    #[test]
    fn collinear_ring_atoms_are_degenerate() {
        let config = PairingConfig::default();
        let mut residue = Residue::new(1, None, "U", ResidueCategory::Polymer);
        residue.add_atom(Atom::new("N1", Element::N, Point::new(0.0, 0.0, 0.0)));
        residue.add_atom(Atom::new("C2", Element::C, Point::new(0.0, 0.0, 0.0)));
        residue.add_atom(Atom::new("N3", Element::N, Point::new(0.0, 0.0, 0.0)));

        assert_eq!(
            FrameFitter::new(&config).fit(&residue).unwrap_err(),
            FitFailure::Degenerate
        );
    }

    #[test]
    fn fit_structure_keeps_ordinals_and_skips_failures() {
        let config = PairingConfig::default();
        let mut chain = Chain::new("A");
        chain.add_residue(fixtures::base_residue(BaseLetter::A, "DA", 1, &Frame::identity()));
        let mut water = Residue::new(2, None, "HOH", ResidueCategory::Solvent);
        water.add_atom(Atom::new("O", Element::O, Point::new(20.0, 0.0, 0.0)));
        chain.add_residue(water);
        chain.add_residue(fixtures::base_residue(BaseLetter::T, "DT", 3, &tilted_frame()));
        let mut structure = Structure::new();
        structure.add_chain(chain);

        let nucleotides = FrameFitter::new(&config).fit_structure(&structure).unwrap();

        let ordinals: Vec<usize> = nucleotides.iter().map(|n| n.ordinal).collect();
        assert_eq!(ordinals, vec![0, 2]);
        assert_eq!(nucleotides[1].key.to_string(), "A.DT3");
        assert_eq!(position_of(&nucleotides, 2), Some(1));
        assert_eq!(position_of(&nucleotides, 1), None);
    }

    #[test]
    fn fit_structure_rejects_empty_residues() {
        let config = PairingConfig::default();
        let mut chain = Chain::new("B");
        chain.add_residue(Residue::new(9, Some('A'), "DG", ResidueCategory::Polymer));
        let mut structure = Structure::new();
        structure.add_chain(chain);

        let err = FrameFitter::new(&config)
            .fit_structure(&structure)
            .unwrap_err();
        assert_eq!(err, Error::empty_residue("B", "9A"));
    }
}
