//! HMAC authentication of inbound requests

use secrecy::{ExposeSecret, SecretSlice};
use thiserror::Error;
use triphase_crypto::utilities::verify_hmac;

use crate::config::core_config::TriphaseConfig;
use crate::error::{ErrorCode, ErrorCodeMixin};


#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("Missing authentication tag")]
    MissingTag,
    #[error("Malformed authentication tag: `{0}`")]
    MalformedTag(String),
    #[error("Authentication tag does not match the request")]
    InvalidTag,
}

impl ErrorCodeMixin for AuthenticationError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::BR_0002
    }
}

/// `true` iff `tag` is HMAC-SHA256(key, payload), compared in constant time.
/// Without a key every payload is accepted.
pub fn verify(payload: &[u8], tag: &[u8], key: Option<&[u8]>) -> bool {
    match key {
        None => true,
        Some(key) => verify_hmac(key, payload, tag),
    }
}

pub struct RequestAuthenticator {
    key: Option<SecretSlice<u8>>,
}

impl RequestAuthenticator {
    pub fn new(key: Option<SecretSlice<u8>>) -> Self {
        if key.is_none() {
            tracing::warn!("No verification key configured, request authentication is disabled");
        }
        Self { key }
    }

    pub fn from_config(config: &TriphaseConfig) -> Self {
        Self::new(
            config
                .verification_key()
                .map(|key| SecretSlice::from(key.expose_secret().to_vec())),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Checks the hex encoded `tag` sent along with `payload`
    pub fn authenticate(&self, payload: &[u8], tag: Option<&str>) -> Result<(), AuthenticationError> {
        let Some(key) = &self.key else {
            return Ok(());
        };

        let tag = tag.ok_or(AuthenticationError::MissingTag)?;
        let tag = hex::decode(tag.trim()).map_err(|e| AuthenticationError::MalformedTag(e.to_string()))?;

        if verify(payload, &tag, Some(key.expose_secret())) {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidTag)
        }
    }
}
