use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrunchError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed atlas data: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, CrunchError>;
