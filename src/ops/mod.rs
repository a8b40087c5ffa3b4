//! Analysis operations: base frames, pair selection, helices, and step parameters.
//!
//! Each stage is a small struct holding a borrowed [`PairingConfig`]; [`analyze`] chains them
//! in order. Stages never mutate the input structure.

mod config;
mod error;
mod fit;
mod hbond;
mod helix;
mod overlap;
mod params;
mod pipeline;
mod select;
mod step;
mod validate;

#[cfg(test)]
mod fixtures;

pub use config::{GEOMETRY_EPSILON, PairingConfig};
pub use error::Error;
pub use fit::{BaseAssignment, FitFailure, FittedBase, FrameFitter, Nucleotide, position_of};
pub use hbond::{
    BondAssignment, BondAtom, Capacity, HydrogenBond, HydrogenBondAssigner, PairSide,
    RejectReason, RejectedContact, capacity,
};
pub use helix::{BackboneContext, BackboneLinks, Helix, HelixChainBuilder, HelixPair};
pub use overlap::{base_outline, overlap_area};
pub use params::{BasePairParameters, RigidBodyParameters, base_pair_parameters, decompose};
pub use pipeline::{Analysis, analyze};
pub use select::{
    CandidateSet, MatchState, PairSelector, SelectedPair, WATSON_CRICK_BONUS, classify,
};
pub use step::{StepParameterCalculator, StepParameters};
pub use validate::{
    MISSING_DNN, PairCandidate, PairChecks, PairDescriptors, PairGeometryValidator, PairType,
};
