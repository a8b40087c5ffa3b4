use super::atom::Atom;
use super::residue::Residue;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: String,
    residues: Vec<Residue>,
}

impl Chain {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            residues: Vec::new(),
        }
    }

    pub fn add_residue(&mut self, residue: Residue) {
        debug_assert!(
            self.residue(residue.id, residue.insertion_code).is_none(),
            "Attempted to add a duplicate residue ID '{}' to chain '{}'",
            residue.id,
            self.id
        );
        self.residues.push(residue);
    }

    pub fn residue(&self, id: i32, insertion_code: Option<char>) -> Option<&Residue> {
        self.residues
            .iter()
            .find(|r| r.id == id && r.insertion_code == insertion_code)
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn iter_residues(&self) -> std::slice::Iter<'_, Residue> {
        self.residues.iter()
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.residues.iter().flat_map(|r| r.iter_atoms())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chain {{ id: \"{}\", residues: {} }}",
            self.id,
            self.residue_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Element, Point, ResidueCategory};

    #[test]
    fn chain_new_creates_empty_chain() {
        let chain = Chain::new("A");

        assert_eq!(chain.id, "A");
        assert!(chain.is_empty());
        assert_eq!(chain.residue_count(), 0);
    }

    #[test]
    fn chain_residue_lookup_respects_insertion_code() {
        let mut chain = Chain::new("B");
        chain.add_residue(Residue::new(5, None, "DC", ResidueCategory::Polymer));
        chain.add_residue(Residue::new(5, Some('A'), "DG", ResidueCategory::Polymer));

        assert_eq!(chain.residue(5, None).map(|r| r.name.as_str()), Some("DC"));
        assert_eq!(
            chain.residue(5, Some('A')).map(|r| r.name.as_str()),
            Some("DG")
        );
        assert!(chain.residue(5, Some('B')).is_none());
    }

    #[test]
    fn chain_preserves_insertion_order() {
        let mut chain = Chain::new("A");
        chain.add_residue(Residue::new(10, None, "G", ResidueCategory::Polymer));
        chain.add_residue(Residue::new(2, None, "C", ResidueCategory::Polymer));

        let ids: Vec<i32> = chain.iter_residues().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 2]);
    }

    #[test]
    fn chain_iter_atoms_flattens_residues() {
        let mut chain = Chain::new("A");
        let mut first = Residue::new(1, None, "A", ResidueCategory::Polymer);
        first.add_atom(Atom::new("N9", Element::N, Point::origin()));
        let mut second = Residue::new(2, None, "U", ResidueCategory::Polymer);
        second.add_atom(Atom::new("N1", Element::N, Point::origin()));
        second.add_atom(Atom::new("O2", Element::O, Point::origin()));
        chain.add_residue(first);
        chain.add_residue(second);

        assert_eq!(chain.iter_atoms().count(), 3);
    }

    #[test]
    fn chain_display_reports_residue_count() {
        let mut chain = Chain::new("C");
        chain.add_residue(Residue::new(1, None, "U", ResidueCategory::Polymer));
        assert_eq!(format!("{}", chain), "Chain { id: \"C\", residues: 1 }");
    }
}
