//! Bearer token verification.
//!
//! The server never inspects tokens itself: an [`IdentityProvider`] turns a
//! bearer token into the [`Identity`] it vouches for. Deployments plug in their
//! provider; [`StaticTokenProvider`] serves fixed tokens from the settings.

use std::collections::HashMap;

use engine::Identity;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("empty bearer token")]
    Empty,
    #[error("unknown bearer token")]
    Unknown,
}

pub trait IdentityProvider: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Provider backed by a fixed token table.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenProvider {
    pub fn new(tokens: impl IntoIterator<Item = (String, Identity)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl IdentityProvider for StaticTokenProvider {
    fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::Empty);
        }
        self.tokens.get(token).cloned().ok_or(IdentityError::Unknown)
    }
}
