use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Certificate parse error: {0}")]
    ParseError(String),

    #[error("Invalid metadata document: {0}")]
    InvalidMetadata(String),

    #[error("Unknown fingerprint algorithm: {0}")]
    UnknownAlgorithm(String),
}

impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
