use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid value for header {name}")]
    InvalidHeader { name: &'static str },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
