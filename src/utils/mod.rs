//! Utility modules providing cross-cutting functionality.
//!
//! Currently limited to the conditional parallel-iteration shim used by frame fitting,
//! candidate evaluation, and step computation.

pub mod parallel;
