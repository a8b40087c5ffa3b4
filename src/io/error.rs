use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error while reading structure: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse PDB record: {details} (line {line_number})")]
    Parse { line_number: usize, details: String },
}

impl Error {
    pub fn parse(line_number: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line_number,
            details: details.into(),
        }
    }
}
