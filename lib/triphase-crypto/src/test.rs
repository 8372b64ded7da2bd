use rcgen::{CertificateParams, KeyPair, PKCS_ECDSA_P256_SHA256, PKCS_ED25519};

use super::certificate::{PublicKeyType, SignerCertificate};
use super::hasher::DigestAlgorithm;
use super::signer::SignatureAlgorithm;
use super::utilities::{create_hmac, verify_hmac};
use super::*;
use crate::certificate::CertificateError;

fn self_signed(key_pair: &KeyPair) -> Vec<u8> {
    CertificateParams::new(vec!["signer.test".to_string()])
        .unwrap()
        .self_signed(key_pair)
        .unwrap()
        .der()
        .to_vec()
}

#[test]
fn test_default_provider_has_all_algorithms() {
    let provider = CryptoProviderImpl::default();

    for digest in [
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ] {
        assert!(provider.get_hasher(digest).is_ok());
    }

    for algorithm in [
        SignatureAlgorithm::Sha256WithRsa,
        SignatureAlgorithm::Sha384WithRsa,
        SignatureAlgorithm::Sha512WithRsa,
        SignatureAlgorithm::Sha256WithEcdsa,
        SignatureAlgorithm::Ed25519,
    ] {
        assert!(provider.get_verifier(algorithm).is_ok());
    }
}

#[test]
fn test_empty_provider_reports_missing() {
    let provider = CryptoProviderImpl::new(HashMap::new(), HashMap::new());

    assert!(matches!(
        provider.get_hasher(DigestAlgorithm::Sha256),
        Err(CryptoProviderError::MissingHasher(DigestAlgorithm::Sha256))
    ));
    assert!(matches!(
        provider.get_verifier(SignatureAlgorithm::Ed25519),
        Err(CryptoProviderError::MissingVerifier(SignatureAlgorithm::Ed25519))
    ));
}

#[test]
fn test_hmac_verify() {
    let key = b"verification-key";
    let tag = create_hmac(key, b"payload").unwrap();

    assert!(verify_hmac(key, b"payload", &tag));
    assert!(!verify_hmac(key, b"payload2", &tag));
    assert!(!verify_hmac(b"other-key", b"payload", &tag));
    assert!(!verify_hmac(key, b"payload", &tag[..16]));
}

#[test]
fn test_hmac_known_vector() {
    // RFC 4231 test case 2
    let tag = create_hmac(b"Jefe", b"what do ya want for nothing?").unwrap();
    assert_eq!(
        hex::encode(tag),
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
}

#[test]
fn test_certificate_ecdsa() {
    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
    let der = self_signed(&key_pair);

    let certificate = SignerCertificate::from_der(&der).unwrap();
    assert_eq!(certificate.der(), der.as_slice());
    assert_eq!(certificate.key_type(), PublicKeyType::Ecdsa);
    assert_eq!(certificate.public_key(), key_pair.public_key_der().as_slice());
    assert!(certificate.supports(SignatureAlgorithm::Sha256WithEcdsa));
    assert!(!certificate.supports(SignatureAlgorithm::Sha256WithRsa));
    assert!(certificate.subject().contains("signer.test"));
    assert!(!certificate.serial().is_empty());
    assert!(!certificate.issuer().is_empty());
}

#[test]
fn test_certificate_ed25519() {
    let key_pair = KeyPair::generate_for(&PKCS_ED25519).unwrap();
    let certificate = SignerCertificate::from_der(&self_signed(&key_pair)).unwrap();

    assert_eq!(certificate.key_type(), PublicKeyType::Ed25519);
    assert!(certificate.supports(SignatureAlgorithm::Ed25519));
    assert!(
        CryptoProviderImpl::default()
            .get_verifier(SignatureAlgorithm::Ed25519)
            .unwrap()
            .check_public_key(certificate.public_key())
            .is_ok()
    );
}

#[test]
fn test_certificate_garbage() {
    assert!(matches!(
        SignerCertificate::from_der(b"not a certificate"),
        Err(CertificateError::Parsing(_))
    ));
}

#[test]
fn test_ecdsa_signature_encodings() {
    use p256::ecdsa::signature::Signer;

    use super::utilities::{ecdsa_signature_to_der, ecdsa_signature_to_raw};

    let key = p256::ecdsa::SigningKey::from_slice(&[0x24; 32]).unwrap();
    let signature: p256::ecdsa::Signature = key.sign(b"message");
    let raw = signature.to_bytes().to_vec();
    let der = signature.to_der().as_bytes().to_vec();

    assert_eq!(ecdsa_signature_to_der(&raw).unwrap(), der);
    assert_eq!(ecdsa_signature_to_der(&der).unwrap(), der);
    assert_eq!(ecdsa_signature_to_raw(&der).unwrap(), raw);
    assert_eq!(ecdsa_signature_to_raw(&raw).unwrap(), raw);
    assert!(ecdsa_signature_to_raw(b"garbage").is_err());
}
