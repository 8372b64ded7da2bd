use p256::ecdsa::signature::Signer;
use p256::pkcs8::DecodePrivateKey;

use super::{decode, encode};

/// Client side signing key with a self-signed certificate
pub struct ClientSigner {
    key: p256::ecdsa::SigningKey,
    certificate: Vec<u8>,
}

impl ClientSigner {
    pub fn new() -> Self {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let certificate = rcgen::CertificateParams::new(vec!["client.triphase.test".to_owned()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();

        Self {
            key: p256::ecdsa::SigningKey::from_pkcs8_der(&key_pair.serialize_der()).unwrap(),
            certificate: certificate.der().to_vec(),
        }
    }

    pub fn certificate(&self) -> String {
        encode(&self.certificate)
    }

    /// Signs the base64url encoded pre-sign bytes, returns the base64url signature
    pub fn sign(&self, pre_sign: &str) -> String {
        let signature: p256::ecdsa::Signature = self.key.sign(&decode(pre_sign));
        encode(signature.to_der().as_bytes())
    }
}
