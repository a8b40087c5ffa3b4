use serde::Serialize;
use smol_str::SmolStr;
use std::fmt;

/// Human-readable residue identity: chain, residue name, number, and insertion code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResidueKey {
    pub chain_id: SmolStr,
    pub name: SmolStr,
    pub seq: i32,
    pub insertion_code: Option<char>,
}

impl ResidueKey {
    pub fn new(chain_id: &str, name: &str, seq: i32, insertion_code: Option<char>) -> Self {
        Self {
            chain_id: SmolStr::new(chain_id),
            name: SmolStr::new(name.trim()),
            seq,
            insertion_code,
        }
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.chain_id, self.name, self.seq)?;
        if let Some(code) = self.insertion_code {
            write!(f, "^{}", code)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_chain_name_and_number() {
        let key = ResidueKey::new("A", "DG", 5, None);
        assert_eq!(key.to_string(), "A.DG5");
    }

    #[test]
    fn display_appends_insertion_code() {
        let key = ResidueKey::new("B", " U ", -3, Some('C'));
        assert_eq!(key.to_string(), "B.U-3^C");
    }
}
