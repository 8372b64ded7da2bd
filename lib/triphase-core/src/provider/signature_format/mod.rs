//! Format specific construction of pre-sign data and final signature containers

use std::sync::Arc;

use triphase_crypto::CryptoProvider;
use triphase_crypto::certificate::SignerCertificate;
use triphase_crypto::signer::SignatureAlgorithm;
use triphase_crypto::utilities::{ecdsa_signature_to_der, ecdsa_signature_to_raw};

use self::error::FormatError;
use crate::model::artifact::SignatureParams;

pub mod cades;
pub mod error;
pub mod pades;
pub mod provider;
pub mod xades;

/// Inputs shared by every step of one job
#[derive(Clone, Copy)]
pub struct SigningInput<'a> {
    pub document: &'a [u8],
    pub params: &'a SignatureParams,
    pub certificate: &'a SignerCertificate,
}

pub trait SignatureFormatter: Send + Sync {
    /// Rejects documents the format cannot carry
    fn check_document(&self, _document: &[u8]) -> Result<(), FormatError> {
        Ok(())
    }

    /// Deterministic: same input, same bytes
    fn pre_sign(&self, input: SigningInput<'_>) -> Result<Vec<u8>, FormatError>;

    /// Embeds a signature computed over [`SignatureFormatter::pre_sign`]
    fn assemble(&self, input: SigningInput<'_>, signature: &[u8]) -> Result<Vec<u8>, FormatError>;

    /// Structural and cryptographic check of an assembled container
    fn validate(&self, signed: &[u8], input: SigningInput<'_>) -> Result<(), FormatError>;
}

pub(crate) fn verify_signature(
    crypto: &Arc<dyn CryptoProvider>,
    algorithm: SignatureAlgorithm,
    message: &[u8],
    signature: &[u8],
    certificate: &SignerCertificate,
) -> Result<(), FormatError> {
    crypto
        .get_verifier(algorithm)?
        .verify(message, signature, certificate.public_key())
        .map_err(|_| FormatError::InvalidSignature)
}

/// CMS carries ECDSA signatures DER encoded
pub(crate) fn cms_signature_value(
    algorithm: SignatureAlgorithm,
    signature: &[u8],
) -> Result<Vec<u8>, FormatError> {
    match algorithm {
        SignatureAlgorithm::Sha256WithEcdsa => {
            ecdsa_signature_to_der(signature).map_err(|_| FormatError::InvalidSignature)
        }
        _ => Ok(signature.to_vec()),
    }
}

/// XML-DSig carries ECDSA signatures as raw `r || s`
pub(crate) fn xml_signature_value(
    algorithm: SignatureAlgorithm,
    signature: &[u8],
) -> Result<Vec<u8>, FormatError> {
    match algorithm {
        SignatureAlgorithm::Sha256WithEcdsa => {
            ecdsa_signature_to_raw(signature).map_err(|_| FormatError::InvalidSignature)
        }
        _ => Ok(signature.to_vec()),
    }
}
