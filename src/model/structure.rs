//! Multi-chain nucleic-acid assemblies and their stable residue ordering.
//!
//! The `Structure` type aggregates chains in file order. Every analysis in `helix-forge` walks
//! residues through [`Structure::iter_residues_with_chain`], whose enumeration index is the
//! residue ordinal used for deterministic tie-breaking throughout pair selection and helix
//! assembly.

use super::atom::Atom;
use super::chain::Chain;
use super::residue::Residue;
use std::fmt;

/// Biomolecular assembly composed of zero or more chains.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Chains in insertion order.
    chains: Vec<Chain>,
}

impl Structure {
    /// Creates an empty structure with no chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chain, asserting unique chain IDs in debug builds.
    ///
    /// # Arguments
    ///
    /// * `chain` - Chain instance whose `id` must be unique within the structure.
    pub fn add_chain(&mut self, chain: Chain) {
        debug_assert!(
            self.chain(&chain.id).is_none(),
            "Attempted to add a duplicate chain ID '{}'",
            chain.id
        );
        self.chains.push(chain);
    }

    /// Retrieves a chain by identifier.
    ///
    /// # Arguments
    ///
    /// * `id` - Chain identifier to search for.
    ///
    /// # Returns
    ///
    /// `Some(&Chain)` if found, otherwise `None`.
    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Finds a residue using chain ID, residue number, and optional insertion code.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - Identifier of the chain to search.
    /// * `residue_id` - Author residue number (PDB `resSeq`).
    /// * `insertion_code` - Optional insertion code differentiating duplicate numbers.
    ///
    /// # Returns
    ///
    /// `Some(&Residue)` when the residue is located, otherwise `None`.
    pub fn find_residue(
        &self,
        chain_id: &str,
        residue_id: i32,
        insertion_code: Option<char>,
    ) -> Option<&Residue> {
        self.chain(chain_id)
            .and_then(|chain| chain.residue(residue_id, insertion_code))
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count()).sum()
    }

    pub fn atom_count(&self) -> usize {
        self.chains.iter().map(|c| c.iter_atoms().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn iter_chains(&self) -> std::slice::Iter<'_, Chain> {
        self.chains.iter()
    }

    /// Iterates residues together with their owning chain in stable ordinal order.
    ///
    /// Chains are visited in insertion order and residues in chain order, so the position of
    /// an item in this iterator is the residue's ordinal.
    ///
    /// # Returns
    ///
    /// An iterator yielding `(&Chain, &Residue)` tuples.
    pub fn iter_residues_with_chain(&self) -> impl Iterator<Item = (&Chain, &Residue)> {
        self.chains
            .iter()
            .flat_map(|chain| chain.iter_residues().map(move |residue| (chain, residue)))
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.chains.iter().flat_map(|c| c.iter_atoms())
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Structure {{ chains: {}, residues: {}, atoms: {} }}",
            self.chain_count(),
            self.residue_count(),
            self.atom_count()
        )
    }
}
