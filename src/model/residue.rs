use super::atom::Atom;
use super::types::{Element, ResidueCategory};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub id: i32,
    pub insertion_code: Option<char>,
    pub name: String,
    pub category: ResidueCategory,
    atoms: Vec<Atom>,
}

impl Residue {
    pub fn new(
        id: i32,
        insertion_code: Option<char>,
        name: &str,
        category: ResidueCategory,
    ) -> Self {
        Self {
            id,
            insertion_code,
            name: name.to_string(),
            category,
            atoms: Vec::new(),
        }
    }

    pub fn add_atom(&mut self, atom: Atom) {
        debug_assert!(
            self.atom(&atom.name).is_none(),
            "Attempted to add a duplicate atom name '{}' to residue '{}'",
            atom.name,
            self.name
        );
        self.atoms.push(atom);
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    /// Position of the named atom in this residue's atom list.
    pub fn atom_index(&self, name: &str) -> Option<usize> {
        self.atoms.iter().position(|a| a.name == name)
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom(name).is_some()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter_atoms(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    pub fn iter_heavy_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|a| a.element.is_heavy_atom())
    }

    pub fn is_solvent(&self) -> bool {
        self.category == ResidueCategory::Solvent
    }

    /// Residue name with surrounding whitespace removed and letters upper-cased.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_ascii_uppercase()
    }

    pub fn count_element(&self, element: Element) -> usize {
        self.atoms.iter().filter(|a| a.element == element).count()
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.insertion_code {
            Some(code) => write!(
                f,
                "Residue {{ id: {}{}, name: \"{}\", category: {}, atoms: {} }}",
                self.id,
                code,
                self.name,
                self.category,
                self.atom_count()
            ),
            None => write!(
                f,
                "Residue {{ id: {}, name: \"{}\", category: {}, atoms: {} }}",
                self.id,
                self.name,
                self.category,
                self.atom_count()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Point;

    fn guanine_fragment() -> Residue {
        let mut residue = Residue::new(12, None, "DG", ResidueCategory::Polymer);
        residue.add_atom(Atom::new("N9", Element::N, Point::new(-1.289, 4.551, 0.0)));
        residue.add_atom(Atom::new("C8", Element::C, Point::new(0.023, 4.962, 0.0)));
        residue.add_atom(Atom::new("O6", Element::O, Point::new(1.554, 0.955, 0.0)));
        residue.add_atom(Atom::new("H8", Element::H, Point::new(0.4, 5.9, 0.0)));
        residue
    }

    #[test]
    fn atom_lookup_by_name_and_index() {
        let residue = guanine_fragment();

        assert_eq!(residue.atom("C8").map(|a| a.element), Some(Element::C));
        assert_eq!(residue.atom_index("O6"), Some(2));
        assert!(residue.has_atom("N9"));
        assert!(!residue.has_atom("N2"));
        assert_eq!(residue.atom_index("N2"), None);
    }

    #[test]
    fn heavy_atom_iteration_skips_hydrogens() {
        let residue = guanine_fragment();
        assert_eq!(residue.atom_count(), 4);
        assert_eq!(residue.iter_heavy_atoms().count(), 3);
        assert_eq!(residue.count_element(Element::N), 1);
    }

    #[test]
    fn new_residue_is_empty() {
        let residue = Residue::new(1, Some('A'), "HOH", ResidueCategory::Solvent);
        assert!(residue.is_empty());
        assert!(residue.is_solvent());
    }

    #[test]
    fn normalized_name_trims_and_uppercases() {
        let residue = Residue::new(1, None, " dg ", ResidueCategory::Polymer);
        assert_eq!(residue.normalized_name(), "DG");
    }

    #[test]
    fn display_includes_insertion_code() {
        let residue = Residue::new(7, Some('B'), "U", ResidueCategory::Polymer);
        assert_eq!(
            format!("{}", residue),
            "Residue { id: 7B, name: \"U\", category: Polymer Residue, atoms: 0 }"
        );
    }
}
