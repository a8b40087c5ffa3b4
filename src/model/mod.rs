//! Core data structures modeling nucleic-acid structures.
//!
//! This module defines atoms, residues, chains, and structures as read from coordinate files,
//! plus the base reference [`frame::Frame`] and the spatial [`grid::Grid`] shared by the
//! analysis operations.

pub mod atom;
pub mod chain;
pub mod frame;
pub mod grid;
pub mod key;
pub mod residue;
pub mod structure;
pub mod types;
