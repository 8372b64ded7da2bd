use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier as _;
use sha2::{Sha256, Sha384, Sha512};

use super::{SignerError, Verifier};
use crate::hasher::DigestAlgorithm;

/// RSASSA-PKCS1-v1_5
pub struct RSAVerifier {
    digest: DigestAlgorithm,
}

impl RSAVerifier {
    pub fn new(digest: DigestAlgorithm) -> Self {
        Self { digest }
    }

    fn parse_public_key(public_key: &[u8]) -> Result<RsaPublicKey, SignerError> {
        RsaPublicKey::from_public_key_der(public_key)
            .map_err(|e| SignerError::CouldNotExtractPublicKey(e.to_string()))
    }
}

impl Verifier for RSAVerifier {
    fn check_public_key(&self, public_key: &[u8]) -> Result<(), SignerError> {
        Self::parse_public_key(public_key).map(|_| ())
    }

    fn verify(&self, input: &[u8], signature: &[u8], public_key: &[u8]) -> Result<(), SignerError> {
        let public_key = Self::parse_public_key(public_key)?;
        let signature =
            Signature::try_from(signature).map_err(|e| SignerError::CouldNotVerify(e.to_string()))?;

        let result = match self.digest {
            DigestAlgorithm::Sha256 => {
                VerifyingKey::<Sha256>::new(public_key).verify(input, &signature)
            }
            DigestAlgorithm::Sha384 => {
                VerifyingKey::<Sha384>::new(public_key).verify(input, &signature)
            }
            DigestAlgorithm::Sha512 => {
                VerifyingKey::<Sha512>::new(public_key).verify(input, &signature)
            }
        };

        result.map_err(|_| SignerError::InvalidSignature)
    }
}
