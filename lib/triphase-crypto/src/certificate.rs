use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::signer::SignatureAlgorithm;

const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";
const EC_PUBLIC_KEY_OID: &str = "1.2.840.10045.2.1";
const ED25519_OID: &str = "1.3.101.112";

#[derive(Debug, PartialEq, Eq, Error)]
pub enum CertificateError {
    #[error("Certificate parsing failed: `{0}`")]
    Parsing(String),
    #[error("Trailing data after certificate")]
    TrailingData,
    #[error("Unsupported public key algorithm: `{0}`")]
    UnsupportedKeyAlgorithm(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicKeyType {
    Rsa,
    Ecdsa,
    Ed25519,
}

/// Owned view of the client signing certificate.
///
/// Keeps the exact DER encodings of the parts that end up inside signature containers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerCertificate {
    der: Vec<u8>,
    subject_public_key_info: Vec<u8>,
    issuer: Vec<u8>,
    serial: Vec<u8>,
    subject: String,
    key_type: PublicKeyType,
}

impl SignerCertificate {
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (rest, certificate) = X509Certificate::from_der(der)
            .map_err(|e| CertificateError::Parsing(e.to_string()))?;
        if !rest.is_empty() {
            return Err(CertificateError::TrailingData);
        }

        let tbs = &certificate.tbs_certificate;
        let key_algorithm = tbs.subject_pki.algorithm.algorithm.to_id_string();
        let key_type = match key_algorithm.as_str() {
            RSA_ENCRYPTION_OID => PublicKeyType::Rsa,
            EC_PUBLIC_KEY_OID => PublicKeyType::Ecdsa,
            ED25519_OID => PublicKeyType::Ed25519,
            _ => return Err(CertificateError::UnsupportedKeyAlgorithm(key_algorithm)),
        };

        Ok(Self {
            der: der.to_vec(),
            subject_public_key_info: tbs.subject_pki.raw.to_vec(),
            issuer: tbs.issuer.as_raw().to_vec(),
            serial: tbs.raw_serial().to_vec(),
            subject: tbs.subject.to_string(),
            key_type,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// DER encoded `SubjectPublicKeyInfo`
    pub fn public_key(&self) -> &[u8] {
        &self.subject_public_key_info
    }

    /// DER encoded issuer `Name`
    pub fn issuer(&self) -> &[u8] {
        &self.issuer
    }

    /// Big-endian serial number as encoded in the certificate
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn key_type(&self) -> PublicKeyType {
        self.key_type
    }

    pub fn supports(&self, algorithm: SignatureAlgorithm) -> bool {
        let required = match algorithm {
            SignatureAlgorithm::Sha256WithRsa
            | SignatureAlgorithm::Sha384WithRsa
            | SignatureAlgorithm::Sha512WithRsa => PublicKeyType::Rsa,
            SignatureAlgorithm::Sha256WithEcdsa => PublicKeyType::Ecdsa,
            SignatureAlgorithm::Ed25519 => PublicKeyType::Ed25519,
        };
        self.key_type == required
    }
}
