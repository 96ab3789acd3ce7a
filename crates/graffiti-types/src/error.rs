use thiserror::Error;

/// Errors produced by type-level operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl TypeError {
    /// Build an [`TypeError::InvalidUrl`] with the offending url attached.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
