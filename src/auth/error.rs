use thiserror::Error;

/// Errors raised while exchanging credentials for a bearer token.
///
/// A rejected login is not an error: the token endpoint answering with a
/// non-200 status is reported as an absent token by [`super::acquire_token`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token endpoint returned an unreadable body: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
