use std::sync::{Arc, LazyLock};

use lopdf::dictionary;
use p256::ecdsa::signature::Signer;
use p256::pkcs8::DecodePrivateKey;
use rsa::pkcs8::EncodePrivateKey;
use rsa::signature::SignatureEncoding;
use shared_types::DocumentRef;
use time::OffsetDateTime;
use time::macros::datetime;
use triphase_crypto::certificate::SignerCertificate;
use triphase_crypto::signer::SignatureAlgorithm;
use triphase_crypto::{CryptoProvider, CryptoProviderImpl};

use crate::model::artifact::SignatureParams;
use crate::model::job::{SignatureFormat, SignatureMode};
use crate::provider::signature_format::SigningInput;

static RSA_KEY: LazyLock<rsa::RsaPrivateKey> = LazyLock::new(|| {
    rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("RSA key generation")
});

enum TestKey {
    Ecdsa(p256::ecdsa::SigningKey),
    Rsa(rsa::pkcs1v15::SigningKey<sha2::Sha256>),
}

/// Stands in for the client side signing device
pub(crate) struct TestSigner {
    pub certificate: SignerCertificate,
    pub algorithm: SignatureAlgorithm,
    key: TestKey,
}

impl TestSigner {
    pub fn ecdsa() -> Self {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let signing_key = p256::ecdsa::SigningKey::from_pkcs8_der(&key_pair.serialize_der()).unwrap();

        Self {
            certificate: self_signed(&key_pair),
            algorithm: SignatureAlgorithm::Sha256WithEcdsa,
            key: TestKey::Ecdsa(signing_key),
        }
    }

    pub fn rsa() -> Self {
        let private_key = RSA_KEY.clone();
        let pkcs8 = private_key.to_pkcs8_der().unwrap();
        let key_pair = rcgen::KeyPair::try_from(pkcs8.as_bytes()).unwrap();

        Self {
            certificate: self_signed(&key_pair),
            algorithm: SignatureAlgorithm::Sha256WithRsa,
            key: TestKey::Rsa(rsa::pkcs1v15::SigningKey::new(private_key)),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match &self.key {
            TestKey::Ecdsa(key) => {
                let signature: p256::ecdsa::Signature = key.sign(message);
                signature.to_der().as_bytes().to_vec()
            }
            TestKey::Rsa(key) => key.sign(message).to_vec(),
        }
    }
}

fn self_signed(key_pair: &rcgen::KeyPair) -> SignerCertificate {
    let params = rcgen::CertificateParams::new(vec!["signer.triphase.test".to_owned()]).unwrap();
    let certificate = params.self_signed(key_pair).unwrap();
    SignerCertificate::from_der(certificate.der()).unwrap()
}

pub(crate) fn crypto() -> Arc<dyn CryptoProvider> {
    Arc::new(CryptoProviderImpl::default())
}

pub(crate) fn signing_time() -> OffsetDateTime {
    datetime!(2024-05-06 07:08:09 UTC)
}

pub(crate) fn dummy_reference() -> DocumentRef {
    DocumentRef::from("doc-1")
}

/// Single blank page with a classic cross-reference table
pub(crate) fn pdf_document() -> Vec<u8> {
    let mut document = lopdf::Document::with_version("1.7");
    let pages_id = document.new_object_id();
    let page_id = document.add_object(lopdf::dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    document.objects.insert(
        pages_id,
        lopdf::Object::Dictionary(lopdf::dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = document.add_object(lopdf::dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut bytes = vec![];
    document.save_to(&mut bytes).unwrap();
    bytes
}

pub(crate) fn signature_params(
    signer: &TestSigner,
    format: SignatureFormat,
    mode: SignatureMode,
    document: &[u8],
) -> SignatureParams {
    let crypto = crypto();
    let digest = signer.algorithm.digest_algorithm();

    SignatureParams {
        format,
        algorithm: signer.algorithm,
        mode,
        signing_time: signing_time(),
        document_digest: crypto.get_hasher(digest).unwrap().hash(document),
        certificate_digest: crypto
            .get_hasher(triphase_crypto::hasher::DigestAlgorithm::Sha256)
            .unwrap()
            .hash(signer.certificate.der()),
        content_description: None,
    }
}

pub(crate) fn signing_input<'a>(
    signer: &'a TestSigner,
    params: &'a SignatureParams,
    document: &'a [u8],
) -> SigningInput<'a> {
    SigningInput {
        document,
        params,
        certificate: &signer.certificate,
    }
}
