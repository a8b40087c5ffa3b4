//! Atom records carried by residues: a name, a chemical element, and a Cartesian position.
//!
//! Atoms are the only coordinate-bearing type in `helix-forge`. Frame fitting reads ring atoms
//! by name, the hydrogen-bond assigner reads polar atoms by element, and the helix builder reads
//! the O3'/P linkage atoms, so every analysis step ultimately resolves to these records.

use super::types::{Element, Point};
use smol_str::SmolStr;
use std::fmt;

/// Named atom with an element and a position in ångströms.
///
/// Atom names follow the PDB convention for nucleic acids (`N9`, `C1'`, `O2'`, `OP1`). Readers
/// normalize legacy `*` primes to `'` before constructing atoms, so lookups by name can rely on
/// a single spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom name as written in the coordinate file (e.g., `N1`).
    pub name: SmolStr,
    /// Chemical element resolved from the element column or the atom name.
    pub element: Element,
    /// Cartesian coordinates measured in ångströms.
    pub pos: Point,
}

impl Atom {
    /// Creates a new atom from a name, element, and position.
    ///
    /// # Arguments
    ///
    /// * `name` - Atom label such as `"N9"` or `"O3'"`.
    /// * `element` - `Element` variant describing the chemical identity.
    /// * `pos` - `Point` with the Cartesian coordinates in ångströms.
    ///
    /// # Returns
    ///
    /// A fully initialized `Atom`.
    pub fn new(name: &str, element: Element, pos: Point) -> Self {
        Self {
            name: SmolStr::new(name),
            element,
            pos,
        }
    }

    /// Squared Euclidean distance to another atom, in Å².
    pub fn distance_squared(&self, other: &Atom) -> f64 {
        nalgebra::distance_squared(&self.pos, &other.pos)
    }

    /// Euclidean distance to another atom, in ångströms.
    pub fn distance(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.pos, &other.pos)
    }

    /// Reports whether the atom can act as a hydrogen-bond donor or acceptor.
    pub fn is_polar(&self) -> bool {
        self.element.is_hbond_capable()
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom {{ name: \"{}\", element: {}, pos: [{:.3}, {:.3}, {:.3}] }}",
            self.name, self.element, self.pos.x, self.pos.y, self.pos.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_new_creates_correct_atom() {
        let pos = Point::new(1.0, 2.0, 3.0);
        let atom = Atom::new("N9", Element::N, pos);

        assert_eq!(atom.name, "N9");
        assert_eq!(atom.element, Element::N);
        assert_eq!(atom.pos, pos);
    }

    #[test]
    fn atom_distances_agree_with_pythagoras() {
        let a = Atom::new("O3'", Element::O, Point::new(0.0, 0.0, 0.0));
        let b = Atom::new("P", Element::P, Point::new(3.0, 4.0, 0.0));

        assert!((a.distance_squared(&b) - 25.0).abs() < 1e-10);
        assert!((a.distance(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn atom_distance_with_negative_coordinates() {
        let a = Atom::new("A", Element::C, Point::new(-1.0, -2.0, -3.0));
        let b = Atom::new("B", Element::C, Point::new(1.0, 2.0, 3.0));

        assert!((a.distance(&b) - 56.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn atom_is_polar_follows_element() {
        assert!(Atom::new("O6", Element::O, Point::origin()).is_polar());
        assert!(Atom::new("N7", Element::N, Point::origin()).is_polar());
        assert!(!Atom::new("C8", Element::C, Point::origin()).is_polar());
    }

    #[test]
    fn atom_display_formats_correctly() {
        let atom = Atom::new("C1'", Element::C, Point::new(1.234, -5.678, 9.012));
        assert_eq!(
            format!("{}", atom),
            "Atom { name: \"C1'\", element: C, pos: [1.234, -5.678, 9.012] }"
        );
    }
}
