use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;

use super::{SignerError, Verifier};

/// ECDSA over P-256 with SHA-256
pub struct ECDSAVerifier {}

impl ECDSAVerifier {
    fn parse_public_key(public_key: &[u8]) -> Result<VerifyingKey, SignerError> {
        VerifyingKey::from_public_key_der(public_key)
            .map_err(|e| SignerError::CouldNotExtractPublicKey(e.to_string()))
    }

    /// Smartcards emit DER encoded signatures, some tokens return the raw `r || s` form
    fn parse_signature(signature: &[u8]) -> Result<Signature, SignerError> {
        Signature::from_der(signature)
            .or_else(|_| Signature::from_slice(signature))
            .map_err(|e| SignerError::CouldNotVerify(e.to_string()))
    }
}

impl Verifier for ECDSAVerifier {
    fn check_public_key(&self, public_key: &[u8]) -> Result<(), SignerError> {
        Self::parse_public_key(public_key).map(|_| ())
    }

    fn verify(&self, input: &[u8], signature: &[u8], public_key: &[u8]) -> Result<(), SignerError> {
        let verifying_key = Self::parse_public_key(public_key)?;
        let signature = Self::parse_signature(signature)?;

        verifying_key
            .verify(input, &signature)
            .map_err(|_| SignerError::InvalidSignature)
    }
}
