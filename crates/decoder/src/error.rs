use core_types::DecodeFailure;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to open input file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read input: {0}")]
    Io(#[from] csv::Error),

    #[error("Malformed row at {0}")]
    MalformedRow(DecodeFailure),
}
