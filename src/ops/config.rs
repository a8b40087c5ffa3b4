//! Threshold parameters shared by every analysis stage.
//!
//! [`PairingConfig`] is built once, validated, and then passed by reference to the frame
//! fitter, pair validator, hydrogen-bond assigner, pair selector, and helix builder. It can be
//! assembled with builder-style setters or decoded from a TOML document in which every key is
//! optional.

use super::error::Error;
use serde::Deserialize;

/// Absolute tolerance applied to every threshold comparison.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Immutable parameter object for base-pair detection and helix assembly.
///
/// Distances are in ångströms, angles in degrees, and areas in Å².
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PairingConfig {
    /// Admissible range of the distance between two base-frame origins.
    pub min_dorg: f64,
    pub max_dorg: f64,
    /// Admissible range of the origin offset along the averaged base normal.
    pub min_dv: f64,
    pub max_dv: f64,
    /// Admissible range of the angle between base normals, folded into [0°, 90°].
    pub min_plane_angle: f64,
    pub max_plane_angle: f64,
    /// Minimum distance between the glycosidic atoms of the two bases.
    pub min_dnn: f64,
    /// Projected ring overlap must stay strictly below this area.
    pub max_overlap_area: f64,
    /// Admissible donor–acceptor distance range.
    pub hb_min_distance: f64,
    pub hb_max_distance: f64,
    /// Minimum number of committed base-base hydrogen bonds.
    pub min_hbonds: usize,
    /// Origin-distance cutoff for enumerating candidate pairs.
    pub coarse_cutoff: f64,
    /// Maximum O3'–P distance for two residues to count as backbone-linked.
    pub backbone_join_distance: f64,
    /// Maximum distance between consecutive pair centers within one helix.
    pub helix_break_distance: f64,
    /// Treat closely stacked pairs as neighbors even without a backbone link.
    pub stack_without_backbone: bool,
    /// Pair-center distance used by the stacking fallback.
    pub stack_distance: f64,
    /// Largest accepted RMS deviation of a base fit.
    pub max_fit_rms: f64,
    /// Largest angle between a bond direction and a donor/acceptor slot.
    pub slot_tolerance: f64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            min_dorg: 0.0,
            max_dorg: 15.0,
            min_dv: 0.0,
            max_dv: 2.5,
            min_plane_angle: 0.0,
            max_plane_angle: 65.0,
            min_dnn: 4.5,
            max_overlap_area: 0.01,
            hb_min_distance: 1.8,
            hb_max_distance: 4.0,
            min_hbonds: 1,
            coarse_cutoff: 15.0,
            backbone_join_distance: 2.5,
            helix_break_distance: 7.5,
            stack_without_backbone: false,
            stack_distance: 5.0,
            max_fit_rms: 0.28,
            slot_tolerance: 75.0,
        }
    }
}

impl PairingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a configuration from TOML and validates it.
    ///
    /// Keys missing from the document keep their defaults; unknown keys are rejected.
    ///
    /// # Arguments
    ///
    /// * `text` - TOML document, for example `max_dv = 2.0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigDecode`] for malformed TOML or unknown keys and
    /// [`Error::InvalidConfig`] when a decoded value fails [`PairingConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: PairingConfig = toml::from_str(text).map_err(|e| Error::ConfigDecode {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn origin_distance(mut self, min: f64, max: f64) -> Self {
        self.min_dorg = min;
        self.max_dorg = max;
        self
    }

    pub fn vertical_offset(mut self, min: f64, max: f64) -> Self {
        self.min_dv = min;
        self.max_dv = max;
        self
    }

    pub fn plane_angle(mut self, min: f64, max: f64) -> Self {
        self.min_plane_angle = min;
        self.max_plane_angle = max;
        self
    }

    pub fn min_dnn(mut self, distance: f64) -> Self {
        self.min_dnn = distance;
        self
    }

    pub fn max_overlap_area(mut self, area: f64) -> Self {
        self.max_overlap_area = area;
        self
    }

    pub fn hbond_distance(mut self, min: f64, max: f64) -> Self {
        self.hb_min_distance = min;
        self.hb_max_distance = max;
        self
    }

    pub fn min_hbonds(mut self, count: usize) -> Self {
        self.min_hbonds = count;
        self
    }

    pub fn coarse_cutoff(mut self, cutoff: f64) -> Self {
        self.coarse_cutoff = cutoff;
        self
    }

    pub fn backbone_join_distance(mut self, distance: f64) -> Self {
        self.backbone_join_distance = distance;
        self
    }

    pub fn helix_break_distance(mut self, distance: f64) -> Self {
        self.helix_break_distance = distance;
        self
    }

    /// Enables the geometric stacking fallback for pairs without backbone evidence.
    ///
    /// # Arguments
    ///
    /// * `distance` - Maximum pair-center distance for two pairs to count as stacked.
    pub fn stack_without_backbone(mut self, distance: f64) -> Self {
        self.stack_without_backbone = true;
        self.stack_distance = distance;
        self
    }

    pub fn max_fit_rms(mut self, rms: f64) -> Self {
        self.max_fit_rms = rms;
        self
    }

    pub fn slot_tolerance(mut self, degrees: f64) -> Self {
        self.slot_tolerance = degrees;
        self
    }

    /// Checks ranges, signs, and cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        check_range("dorg", self.min_dorg, self.max_dorg)?;
        check_range("dv", self.min_dv, self.max_dv)?;
        check_range("plane_angle", self.min_plane_angle, self.max_plane_angle)?;
        check_range("hb_distance", self.hb_min_distance, self.hb_max_distance)?;

        if self.max_plane_angle > 90.0 {
            return Err(Error::invalid_config(
                "max_plane_angle",
                "plane angles are folded into [0, 90] degrees",
            ));
        }
        if !(self.slot_tolerance > 0.0 && self.slot_tolerance <= 180.0) {
            return Err(Error::invalid_config(
                "slot_tolerance",
                "must lie in (0, 180] degrees",
            ));
        }

        for (field, value) in [
            ("min_dnn", self.min_dnn),
            ("max_overlap_area", self.max_overlap_area),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_config(field, "must be finite and non-negative"));
            }
        }

        for (field, value) in [
            ("coarse_cutoff", self.coarse_cutoff),
            ("backbone_join_distance", self.backbone_join_distance),
            ("helix_break_distance", self.helix_break_distance),
            ("stack_distance", self.stack_distance),
            ("max_fit_rms", self.max_fit_rms),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid_config(field, "must be finite and positive"));
            }
        }

        if self.coarse_cutoff + GEOMETRY_EPSILON < self.max_dorg {
            return Err(Error::invalid_config(
                "coarse_cutoff",
                "must not be smaller than max_dorg",
            ));
        }

        Ok(())
    }

    /// Inclusive range test with [`GEOMETRY_EPSILON`] slack on both ends.
    pub(crate) fn within(value: f64, min: f64, max: f64) -> bool {
        value >= min - GEOMETRY_EPSILON && value <= max + GEOMETRY_EPSILON
    }
}

fn check_range(field: &str, min: f64, max: f64) -> Result<(), Error> {
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::invalid_config(field, "bounds must be finite"));
    }
    if min < 0.0 {
        return Err(Error::invalid_config(field, "lower bound must be non-negative"));
    }
    if min > max {
        return Err(Error::invalid_config(
            field,
            format!("lower bound {min} exceeds upper bound {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PairingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_dorg, 15.0);
        assert_eq!(config.max_dv, 2.5);
        assert_eq!(config.max_plane_angle, 65.0);
        assert_eq!(config.min_dnn, 4.5);
        assert_eq!(config.max_overlap_area, 0.01);
        assert_eq!(config.min_hbonds, 1);
        assert_eq!(config.backbone_join_distance, 2.5);
    }

    #[test]
    fn setters_override_defaults() {
        let config = PairingConfig::new()
            .origin_distance(1.0, 12.0)
            .vertical_offset(0.0, 2.0)
            .hbond_distance(2.0, 3.5)
            .min_hbonds(2)
            .stack_without_backbone(4.5);

        assert_eq!(config.min_dorg, 1.0);
        assert_eq!(config.max_dorg, 12.0);
        assert_eq!(config.max_dv, 2.0);
        assert_eq!(config.hb_max_distance, 3.5);
        assert_eq!(config.min_hbonds, 2);
        assert!(config.stack_without_backbone);
        assert_eq!(config.stack_distance, 4.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let config = PairingConfig::new().hbond_distance(4.0, 1.8);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { field, .. }) if field == "hb_distance"
        ));
    }

    #[test]
    fn validate_rejects_non_positive_cutoffs() {
        let config = PairingConfig::new().backbone_join_distance(0.0);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { field, .. }) if field == "backbone_join_distance"
        ));
    }

    #[test]
    fn validate_rejects_coarse_cutoff_below_max_dorg() {
        let config = PairingConfig::new().coarse_cutoff(10.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unfolded_plane_angle() {
        let config = PairingConfig::new().plane_angle(0.0, 120.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_toml_str_keeps_defaults_for_missing_keys() {
        let config = PairingConfig::from_toml_str("max_dv = 2.0\nmin_hbonds = 2\n").unwrap();
        assert_eq!(config.max_dv, 2.0);
        assert_eq!(config.min_hbonds, 2);
        assert_eq!(config.max_dorg, 15.0);
    }

    #[test]
    fn from_toml_str_rejects_unknown_keys() {
        let err = PairingConfig::from_toml_str("max_distance = 3.0").unwrap_err();
        assert!(matches!(err, Error::ConfigDecode { .. }));
    }

    #[test]
    fn from_toml_str_validates_decoded_values() {
        let err = PairingConfig::from_toml_str("min_dv = 3.0\nmax_dv = 1.0").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn within_applies_epsilon_on_both_ends() {
        assert!(PairingConfig::within(2.5 + 1e-12, 0.0, 2.5));
        assert!(PairingConfig::within(-1e-12, 0.0, 2.5));
        assert!(!PairingConfig::within(2.5 + 1e-6, 0.0, 2.5));
    }
}
