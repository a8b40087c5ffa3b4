//! Read-only access to the embedded base templates and residue registry.

use crate::db;
use crate::model::types::BaseLetter;

pub use crate::db::{RegisteredResidue, TemplateView};

/// Looks up the template for a parent base letter.
pub fn get(letter: BaseLetter) -> Option<TemplateView<'static>> {
    db::get_template(letter)
}

/// Resolves a residue name (`"DA"`, `"PSU"`, ...) to its registered parent base.
pub fn resolve(residue_name: &str) -> Option<RegisteredResidue> {
    db::lookup_residue(residue_name)
}
