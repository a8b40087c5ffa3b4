//! Structure input.
//!
//! Only PDB coordinates are read; everything downstream works on the in-memory
//! [`Structure`](crate::Structure).

mod error;
mod pdb;

pub use pdb::reader::read as read_pdb_structure;

pub use error::Error;
