use strum::{Display, EnumString};
use thiserror::Error;

use crate::hasher::DigestAlgorithm;

pub mod ecdsa;
pub mod eddsa;
pub mod rsa;


#[derive(Debug, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("Could not extract public key: `{0}`")]
    CouldNotExtractPublicKey(String),
    #[error("Could not verify: `{0}`")]
    CouldNotVerify(String),
    #[error("Invalid signature")]
    InvalidSignature,
}

/// Verification of raw signature values produced by an external signing device.
///
/// `public_key` is always a DER encoded `SubjectPublicKeyInfo`.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Verifier: Send + Sync {
    fn check_public_key(&self, public_key: &[u8]) -> Result<(), SignerError>;

    fn verify(&self, input: &[u8], signature: &[u8], public_key: &[u8])
    -> Result<(), SignerError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum SignatureAlgorithm {
    #[strum(serialize = "SHA256withRSA")]
    Sha256WithRsa,
    #[strum(serialize = "SHA384withRSA")]
    Sha384WithRsa,
    #[strum(serialize = "SHA512withRSA")]
    Sha512WithRsa,
    #[strum(serialize = "SHA256withECDSA")]
    Sha256WithEcdsa,
    #[strum(serialize = "Ed25519")]
    Ed25519,
}

const ALL_ALGORITHMS: [SignatureAlgorithm; 5] = [
    SignatureAlgorithm::Sha256WithRsa,
    SignatureAlgorithm::Sha384WithRsa,
    SignatureAlgorithm::Sha512WithRsa,
    SignatureAlgorithm::Sha256WithEcdsa,
    SignatureAlgorithm::Ed25519,
];

impl SignatureAlgorithm {
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::Sha256WithRsa | Self::Sha256WithEcdsa => DigestAlgorithm::Sha256,
            Self::Sha384WithRsa => DigestAlgorithm::Sha384,
            Self::Sha512WithRsa | Self::Ed25519 => DigestAlgorithm::Sha512,
        }
    }

    /// Object identifier used in the CMS `signatureAlgorithm` field
    pub fn oid(&self) -> &'static [u64] {
        match self {
            Self::Sha256WithRsa => &[1, 2, 840, 113549, 1, 1, 11],
            Self::Sha384WithRsa => &[1, 2, 840, 113549, 1, 1, 12],
            Self::Sha512WithRsa => &[1, 2, 840, 113549, 1, 1, 13],
            Self::Sha256WithEcdsa => &[1, 2, 840, 10045, 4, 3, 2],
            Self::Ed25519 => &[1, 3, 101, 112],
        }
    }

    pub fn from_oid(oid: &[u64]) -> Option<Self> {
        ALL_ALGORITHMS
            .into_iter()
            .find(|algorithm| algorithm.oid() == oid)
    }

    /// RSA algorithm identifiers carry explicit NULL parameters
    pub fn has_null_parameters(&self) -> bool {
        matches!(
            self,
            Self::Sha256WithRsa | Self::Sha384WithRsa | Self::Sha512WithRsa
        )
    }

    /// XML-DSig `SignatureMethod` algorithm URI
    pub fn xml_uri(&self) -> &'static str {
        match self {
            Self::Sha256WithRsa => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            Self::Sha384WithRsa => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            Self::Sha512WithRsa => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            Self::Sha256WithEcdsa => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            Self::Ed25519 => "http://www.w3.org/2021/04/xmldsig-more#eddsa-ed25519",
        }
    }

    pub fn from_xml_uri(uri: &str) -> Option<Self> {
        ALL_ALGORITHMS
            .into_iter()
            .find(|algorithm| algorithm.xml_uri() == uri)
    }
}
