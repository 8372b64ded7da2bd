use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use self::hasher::{DigestAlgorithm, Hasher};
use self::signer::{SignatureAlgorithm, Verifier};

pub mod certificate;
pub mod hasher;
pub mod signer;
pub mod utilities;

#[cfg(test)]
mod test;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum CryptoProviderError {
    #[error("Missing hasher: `{0}`")]
    MissingHasher(DigestAlgorithm),
    #[error("Missing verifier: `{0}`")]
    MissingVerifier(SignatureAlgorithm),
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CryptoProvider: Send + Sync {
    fn get_hasher(&self, algorithm: DigestAlgorithm)
    -> Result<Arc<dyn Hasher>, CryptoProviderError>;

    fn get_verifier(
        &self,
        algorithm: SignatureAlgorithm,
    ) -> Result<Arc<dyn Verifier>, CryptoProviderError>;
}

#[derive(Clone)]
pub struct CryptoProviderImpl {
    hashers: HashMap<DigestAlgorithm, Arc<dyn Hasher>>,
    verifiers: HashMap<SignatureAlgorithm, Arc<dyn Verifier>>,
}

impl CryptoProviderImpl {
    pub fn new(
        hashers: HashMap<DigestAlgorithm, Arc<dyn Hasher>>,
        verifiers: HashMap<SignatureAlgorithm, Arc<dyn Verifier>>,
    ) -> Self {
        Self { hashers, verifiers }
    }
}

impl Default for CryptoProviderImpl {
    /// All supported hashers and verifiers
    fn default() -> Self {
        use self::hasher::sha::{SHA256, SHA384, SHA512};
        use self::signer::ecdsa::ECDSAVerifier;
        use self::signer::eddsa::EDDSAVerifier;
        use self::signer::rsa::RSAVerifier;

        let hashers: Vec<(DigestAlgorithm, Arc<dyn Hasher>)> = vec![
            (DigestAlgorithm::Sha256, Arc::new(SHA256 {})),
            (DigestAlgorithm::Sha384, Arc::new(SHA384 {})),
            (DigestAlgorithm::Sha512, Arc::new(SHA512 {})),
        ];

        let verifiers: Vec<(SignatureAlgorithm, Arc<dyn Verifier>)> = vec![
            (
                SignatureAlgorithm::Sha256WithRsa,
                Arc::new(RSAVerifier::new(DigestAlgorithm::Sha256)),
            ),
            (
                SignatureAlgorithm::Sha384WithRsa,
                Arc::new(RSAVerifier::new(DigestAlgorithm::Sha384)),
            ),
            (
                SignatureAlgorithm::Sha512WithRsa,
                Arc::new(RSAVerifier::new(DigestAlgorithm::Sha512)),
            ),
            (SignatureAlgorithm::Sha256WithEcdsa, Arc::new(ECDSAVerifier {})),
            (SignatureAlgorithm::Ed25519, Arc::new(EDDSAVerifier {})),
        ];

        Self::new(HashMap::from_iter(hashers), HashMap::from_iter(verifiers))
    }
}

impl CryptoProvider for CryptoProviderImpl {
    fn get_hasher(
        &self,
        algorithm: DigestAlgorithm,
    ) -> Result<Arc<dyn Hasher>, CryptoProviderError> {
        Ok(self
            .hashers
            .get(&algorithm)
            .ok_or(CryptoProviderError::MissingHasher(algorithm))?
            .clone())
    }

    fn get_verifier(
        &self,
        algorithm: SignatureAlgorithm,
    ) -> Result<Arc<dyn Verifier>, CryptoProviderError> {
        Ok(self
            .verifiers
            .get(&algorithm)
            .ok_or(CryptoProviderError::MissingVerifier(algorithm))?
            .clone())
    }
}
