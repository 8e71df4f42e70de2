use thiserror::Error;

pub type Result<T> = std::result::Result<T, FingerprintError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("{name} must be greater than zero")]
    ZeroParameter { name: &'static str },
}
