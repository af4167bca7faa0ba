use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load metadata table: {0}")]
    Load(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row not found: {0}")]
    RowNotFound(usize),

    #[error("Image directory not found: {}", .0.display())]
    ImageDirNotFound(PathBuf),

    #[error("Malformed asset id: {0:?}")]
    MalformedId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether a bulk pass may log this error and move on to the next item.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::RowNotFound(_) | Error::ImageDirNotFound(_) | Error::MalformedId(_)
        )
    }
}
