use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    #[error("No file provided")]
    EmptyUpload,

    #[error("{0}")]
    Other(String),
}
