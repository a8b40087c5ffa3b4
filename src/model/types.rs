use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type Point = Point3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Element {
    H = 1,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Na = 11,
    Mg = 12,
    P = 15,
    S = 16,
    Cl = 17,
    K = 19,
    Ca = 20,
    Mn = 25,
    Fe = 26,
    Zn = 30,
    Se = 34,
    Br = 35,
    I = 53,
    Unknown = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResidueCategory {
    Polymer,
    Hetero,
    Solvent,
}

/// Parent base identity shared by standard and modified nucleotides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BaseLetter {
    A,
    C,
    G,
    T,
    U,
    I,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseFamily {
    Purine,
    Pyrimidine,
}

/// Local hybridization of a polar base atom, used to key hydrogen-bond capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hybridization {
    Sp2,
    Sp3,
}

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::I => "I",
            Element::Unknown => "X",
        }
    }

    pub fn is_heavy_atom(&self) -> bool {
        !matches!(self, Element::H | Element::Unknown)
    }

    /// Nitrogen and oxygen are the only donors and acceptors considered for base pairing.
    pub fn is_hbond_capable(&self) -> bool {
        matches!(self, Element::N | Element::O)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let normalized = match chars.next() {
            Some(first) => {
                let mut out = first.to_ascii_uppercase().to_string();
                out.extend(chars.map(|c| c.to_ascii_lowercase()));
                out
            }
            None => return Err("Empty element symbol".to_string()),
        };

        match normalized.as_str() {
            "H" | "D" => Ok(Element::H),
            "C" => Ok(Element::C),
            "N" => Ok(Element::N),
            "O" => Ok(Element::O),
            "F" => Ok(Element::F),
            "Na" => Ok(Element::Na),
            "Mg" => Ok(Element::Mg),
            "P" => Ok(Element::P),
            "S" => Ok(Element::S),
            "Cl" => Ok(Element::Cl),
            "K" => Ok(Element::K),
            "Ca" => Ok(Element::Ca),
            "Mn" => Ok(Element::Mn),
            "Fe" => Ok(Element::Fe),
            "Zn" => Ok(Element::Zn),
            "Se" => Ok(Element::Se),
            "Br" => Ok(Element::Br),
            "I" => Ok(Element::I),
            "X" => Ok(Element::Unknown),
            _ => Err(format!("Invalid element symbol: {}", s)),
        }
    }
}

impl ResidueCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ResidueCategory::Polymer => "Polymer Residue",
            ResidueCategory::Hetero => "Hetero Residue",
            ResidueCategory::Solvent => "Solvent",
        }
    }
}

impl fmt::Display for ResidueCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ResidueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Polymer" => Ok(ResidueCategory::Polymer),
            "Hetero" => Ok(ResidueCategory::Hetero),
            "Solvent" => Ok(ResidueCategory::Solvent),
            _ => Err(format!("Invalid residue category: {}", s)),
        }
    }
}

impl BaseLetter {
    pub fn family(&self) -> BaseFamily {
        match self {
            BaseLetter::A | BaseLetter::G | BaseLetter::I => BaseFamily::Purine,
            BaseLetter::C | BaseLetter::T | BaseLetter::U => BaseFamily::Pyrimidine,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            BaseLetter::A => 'A',
            BaseLetter::C => 'C',
            BaseLetter::G => 'G',
            BaseLetter::T => 'T',
            BaseLetter::U => 'U',
            BaseLetter::I => 'I',
        }
    }

    /// Reports whether two letters form a canonical Watson-Crick combination.
    pub fn is_complementary(&self, other: BaseLetter) -> bool {
        matches!(
            (self, other),
            (BaseLetter::A, BaseLetter::T)
                | (BaseLetter::T, BaseLetter::A)
                | (BaseLetter::A, BaseLetter::U)
                | (BaseLetter::U, BaseLetter::A)
                | (BaseLetter::G, BaseLetter::C)
                | (BaseLetter::C, BaseLetter::G)
        )
    }
}

impl fmt::Display for BaseLetter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for BaseLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(BaseLetter::A),
            "C" => Ok(BaseLetter::C),
            "G" => Ok(BaseLetter::G),
            "T" => Ok(BaseLetter::T),
            "U" => Ok(BaseLetter::U),
            "I" => Ok(BaseLetter::I),
            _ => Err(format!("Invalid base letter: {}", s)),
        }
    }
}

impl fmt::Display for BaseFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BaseFamily::Purine => write!(f, "Purine"),
            BaseFamily::Pyrimidine => write!(f, "Pyrimidine"),
        }
    }
}

impl fmt::Display for Hybridization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Hybridization::Sp2 => write!(f, "sp2"),
            Hybridization::Sp3 => write!(f, "sp3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_symbol_returns_correct_value() {
        assert_eq!(Element::N.symbol(), "N");
        assert_eq!(Element::Mg.symbol(), "Mg");
        assert_eq!(Element::Unknown.symbol(), "X");
    }

    #[test]
    fn element_from_str_normalizes_case() {
        assert_eq!(Element::from_str("MG").unwrap(), Element::Mg);
        assert_eq!(Element::from_str("cl").unwrap(), Element::Cl);
        assert_eq!(Element::from_str(" o ").unwrap(), Element::O);
        assert_eq!(Element::from_str("D").unwrap(), Element::H);
    }

    #[test]
    fn element_from_str_rejects_unknown_symbols() {
        assert!(Element::from_str("Qq").is_err());
        assert!(Element::from_str("").is_err());
    }

    #[test]
    fn element_hbond_capability_is_limited_to_nitrogen_and_oxygen() {
        assert!(Element::N.is_hbond_capable());
        assert!(Element::O.is_hbond_capable());
        assert!(!Element::C.is_hbond_capable());
        assert!(!Element::S.is_hbond_capable());
    }

    #[test]
    fn element_is_heavy_atom_excludes_hydrogen() {
        assert!(Element::C.is_heavy_atom());
        assert!(!Element::H.is_heavy_atom());
        assert!(!Element::Unknown.is_heavy_atom());
    }

    #[test]
    fn residue_category_round_trips_through_strings() {
        assert_eq!(ResidueCategory::Polymer.name(), "Polymer Residue");
        assert_eq!(format!("{}", ResidueCategory::Solvent), "Solvent");
        assert_eq!(
            ResidueCategory::from_str("Hetero").unwrap(),
            ResidueCategory::Hetero
        );
        assert!(ResidueCategory::from_str("Ion").is_err());
    }

    #[test]
    fn base_letter_family_splits_purines_and_pyrimidines() {
        assert_eq!(BaseLetter::A.family(), BaseFamily::Purine);
        assert_eq!(BaseLetter::I.family(), BaseFamily::Purine);
        assert_eq!(BaseLetter::T.family(), BaseFamily::Pyrimidine);
        assert_eq!(BaseLetter::U.family(), BaseFamily::Pyrimidine);
    }

    #[test]
    fn base_letter_complementarity_is_symmetric_and_canonical() {
        assert!(BaseLetter::A.is_complementary(BaseLetter::T));
        assert!(BaseLetter::U.is_complementary(BaseLetter::A));
        assert!(BaseLetter::G.is_complementary(BaseLetter::C));
        assert!(!BaseLetter::G.is_complementary(BaseLetter::U));
        assert!(!BaseLetter::A.is_complementary(BaseLetter::A));
        assert!(!BaseLetter::I.is_complementary(BaseLetter::C));
    }

    #[test]
    fn base_letter_from_str_accepts_lowercase() {
        assert_eq!(BaseLetter::from_str("g").unwrap(), BaseLetter::G);
        assert!(BaseLetter::from_str("N").is_err());
    }
}
