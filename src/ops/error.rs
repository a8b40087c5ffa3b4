//! Shared error type returned by the analysis operations.
//!
//! Per-residue fit failures and per-pair rejections are ordinary values in this crate; only
//! structurally invalid input and unusable configurations surface as an [`Error`].

use thiserror::Error;

/// Error conditions surfaced by the operations layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A residue without atoms was handed to the pipeline.
    #[error("residue {res_id} in chain '{chain_id}' has no atoms")]
    EmptyResidue { chain_id: String, res_id: String },

    /// A configuration value is out of range or inconsistent with another value.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// A configuration document could not be decoded.
    #[error("failed to decode configuration: {reason}")]
    ConfigDecode { reason: String },
}

impl Error {
    /// Helper for constructing an [`Error::EmptyResidue`] variant.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - Chain containing the offending residue.
    /// * `res_id` - Residue number, including any insertion code.
    pub fn empty_residue(chain_id: impl Into<String>, res_id: impl Into<String>) -> Self {
        Self::EmptyResidue {
            chain_id: chain_id.into(),
            res_id: res_id.into(),
        }
    }

    /// Helper for constructing an [`Error::InvalidConfig`] variant.
    ///
    /// # Arguments
    ///
    /// * `field` - Configuration key that failed validation.
    /// * `reason` - Explanation of the violated constraint.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
