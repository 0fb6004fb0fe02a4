use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("Duplicate resource in catalog: {0}")]
    DuplicateResource(String),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CatDiffError>;
