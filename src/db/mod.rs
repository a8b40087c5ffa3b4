//! Internal database API exposing read-only views over base templates and the residue registry.
//!
//! Callers obtain [`TemplateView`] handles keyed by base letter and resolve residue names
//! through the registry, so supporting a new modified nucleotide only touches the TOML data.

mod loader;
mod schema;
mod store;

use crate::model::types::{BaseFamily, BaseLetter, Element, Hybridization, Point};

/// Retrieves the template for a parent base letter.
///
/// # Arguments
///
/// * `letter` - Base letter such as [`BaseLetter::G`].
///
/// # Returns
///
/// `Some(TemplateView)` when a template exists, otherwise `None`.
pub fn get_template(letter: BaseLetter) -> Option<TemplateView<'static>> {
    store::get_store()
        .templates_by_letter
        .get(&letter)
        .map(TemplateView::new)
}

/// Registry outcome for a residue name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredResidue {
    /// Parent base whose template the residue is fitted against.
    pub parent: BaseLetter,
    /// `true` for modified nucleotides, `false` for standard spellings.
    pub modified: bool,
}

/// Resolves a residue name through the registry.
///
/// The name is trimmed and upper-cased before lookup.
///
/// # Arguments
///
/// * `name` - Residue name as written in the coordinate file.
///
/// # Returns
///
/// `Some(RegisteredResidue)` for registered names, `None` for a template-lookup miss.
pub fn lookup_residue(name: &str) -> Option<RegisteredResidue> {
    let key = name.trim().to_ascii_uppercase();
    store::get_store()
        .registry
        .get(&key)
        .map(|entry| RegisteredResidue {
            parent: entry.parent,
            modified: entry.modified,
        })
}

/// Lightweight wrapper granting read-only access to a stored template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateView<'a> {
    inner: &'a store::InternalTemplate,
}

impl<'a> TemplateView<'a> {
    /// Creates a new view from the internal store entry.
    pub fn new(inner: &'a store::InternalTemplate) -> Self {
        Self { inner }
    }

    /// Returns the template's name.
    pub fn name(&self) -> &'a str {
        &self.inner.schema.info.name
    }

    pub fn letter(&self) -> BaseLetter {
        self.inner.schema.info.letter
    }

    pub fn family(&self) -> BaseFamily {
        self.inner.schema.info.family
    }

    /// Name of the atom carrying the glycosidic bond (`N9` or `N1`).
    pub fn glycosidic_atom(&self) -> &'a str {
        &self.inner.schema.info.glycosidic
    }

    /// Iterates template atoms with their elements and idealized coordinates.
    ///
    /// # Returns
    ///
    /// An iterator yielding `(name, element, Point)` tuples preserving declaration order.
    pub fn atoms(&self) -> impl Iterator<Item = (&'a str, Element, Point)> + 'a {
        self.inner
            .schema
            .atoms
            .iter()
            .map(|a| (a.name.as_str(), a.element, Point::from(a.pos)))
    }

    /// Idealized coordinates of a named template atom.
    pub fn atom_position(&self, name: &str) -> Option<Point> {
        self.inner
            .schema
            .atoms
            .iter()
            .find(|a| a.name == name)
            .map(|a| Point::from(a.pos))
    }

    /// Iterates ring atoms in perimeter order with their idealized coordinates.
    ///
    /// These are the reference points used for the least-squares fit and the outline used
    /// for overlap computations.
    pub fn ring_atoms(&self) -> impl Iterator<Item = (&'a str, Point)> + 'a {
        let inner = self.inner;
        inner.schema.ring.perimeter.iter().filter_map(move |name| {
            inner
                .schema
                .atoms
                .iter()
                .find(|a| &a.name == name)
                .map(|a| (a.name.as_str(), Point::from(a.pos)))
        })
    }

    /// Exocyclic atom attached to a ring atom, with its alternative spellings.
    ///
    /// # Arguments
    ///
    /// * `ring_atom` - Name of a ring atom from [`TemplateView::ring_atoms`].
    ///
    /// # Returns
    ///
    /// `Some((name, aliases))` when the ring atom carries a substituent, otherwise `None`.
    pub fn substituent(&self, ring_atom: &str) -> Option<(&'a str, &'a [String])> {
        self.inner
            .schema
            .substituents
            .iter()
            .find(|s| s.ring == ring_atom)
            .map(|s| (s.atom.as_str(), s.aliases.as_slice()))
    }

    /// Iterates polar atoms as `(name, hybridization, attached hydrogens)`.
    pub fn polar_atoms(&self) -> impl Iterator<Item = (&'a str, Hybridization, u8)> + 'a {
        self.inner
            .schema
            .polar
            .iter()
            .map(|p| (p.name.as_str(), p.hybridization, p.hydrogens))
    }

    /// Hybridization and hydrogen count of a named polar atom.
    pub fn polar_atom(&self, name: &str) -> Option<(Hybridization, u8)> {
        self.inner
            .schema
            .polar
            .iter()
            .find(|p| p.name == name)
            .map(|p| (p.hybridization, p.hydrogens))
    }
}
