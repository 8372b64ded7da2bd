//! CMS `SignedData` (RFC 5652) with CAdES signed attributes.
//!
//! Written with `yasna`, read back through the RFC 5652 types of the `cms` crate.

use std::sync::Arc;

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedAttributes, SignedData};
use der::asn1::{ObjectIdentifier as DerObjectIdentifier, OctetString};
use der::{Any, Decode, Encode};
use triphase_crypto::CryptoProvider;
use triphase_crypto::hasher::DigestAlgorithm;
use triphase_crypto::signer::SignatureAlgorithm;
use yasna::models::{ObjectIdentifier, UTCTime};
use yasna::{DERWriter, Tag};

use super::super::error::FormatError;
use super::super::{SigningInput, verify_signature};

const OID_DATA: &[u64] = &[1, 2, 840, 113549, 1, 7, 1];
const OID_SIGNED_DATA: &[u64] = &[1, 2, 840, 113549, 1, 7, 2];
const OID_CONTENT_TYPE: &[u64] = &[1, 2, 840, 113549, 1, 9, 3];
const OID_MESSAGE_DIGEST: &[u64] = &[1, 2, 840, 113549, 1, 9, 4];
const OID_SIGNING_TIME: &[u64] = &[1, 2, 840, 113549, 1, 9, 5];
const OID_CONTENT_HINTS: &[u64] = &[1, 2, 840, 113549, 1, 9, 16, 2, 4];
const OID_SIGNING_CERTIFICATE_V2: &[u64] = &[1, 2, 840, 113549, 1, 9, 16, 2, 47];

const SIGNED_DATA_VERSION: u8 = 1;
const SIGNER_INFO_VERSION: u8 = 1;

fn oid(components: &[u64]) -> ObjectIdentifier {
    ObjectIdentifier::from_slice(components)
}

/// DER `SET OF Attribute`, the bytes covered by the signature.
///
/// `message_digest` is the digest of the signed content.
pub(crate) fn signed_attributes(input: SigningInput<'_>, message_digest: &[u8]) -> Vec<u8> {
    yasna::construct_der(|writer| write_signed_attributes(writer, input, message_digest))
}

fn write_signed_attributes(writer: DERWriter, input: SigningInput<'_>, message_digest: &[u8]) {
    let params = input.params;

    writer.write_set_of(|writer| {
        write_attribute(writer.next(), OID_CONTENT_TYPE, |writer| {
            writer.write_oid(&oid(OID_DATA))
        });
        write_attribute(writer.next(), OID_SIGNING_TIME, |writer| {
            writer.write_utctime(&UTCTime::from_datetime(params.signing_time))
        });
        write_attribute(writer.next(), OID_MESSAGE_DIGEST, |writer| {
            writer.write_bytes(message_digest)
        });
        // ESSCertIDv2 with the default SHA-256 hash algorithm
        write_attribute(writer.next(), OID_SIGNING_CERTIFICATE_V2, |writer| {
            writer.write_sequence(|writer| {
                writer.next().write_sequence(|writer| {
                    writer.next().write_sequence(|writer| {
                        writer.next().write_bytes(&params.certificate_digest)
                    })
                })
            })
        });
        if let Some(description) = &params.content_description {
            write_attribute(writer.next(), OID_CONTENT_HINTS, |writer| {
                writer.write_sequence(|writer| {
                    writer.next().write_utf8_string(description);
                    writer.next().write_oid(&oid(OID_DATA));
                })
            });
        }
    })
}

fn write_attribute(writer: DERWriter, attribute: &[u64], value: impl FnOnce(DERWriter)) {
    writer.write_sequence(|writer| {
        writer.next().write_oid(&oid(attribute));
        writer.next().write_set(|writer| value(writer.next()));
    })
}

fn write_algorithm_identifier(writer: DERWriter, algorithm: &[u64], null_parameters: bool) {
    writer.write_sequence(|writer| {
        writer.next().write_oid(&oid(algorithm));
        if null_parameters {
            writer.next().write_null();
        }
    })
}

/// `ContentInfo` wrapping a `SignedData` with a single signer.
///
/// `content` is encapsulated when given, otherwise the signature is detached.
pub(crate) fn signed_data(
    input: SigningInput<'_>,
    message_digest: &[u8],
    signature: &[u8],
    content: Option<&[u8]>,
) -> Vec<u8> {
    let algorithm = input.params.algorithm;
    let digest_oid = algorithm.digest_algorithm().oid();
    let certificate = input.certificate;

    yasna::construct_der(|writer| {
        writer.write_sequence(|writer| {
            writer.next().write_oid(&oid(OID_SIGNED_DATA));
            writer.next().write_tagged(Tag::context(0), |writer| {
                writer.write_sequence(|writer| {
                    writer.next().write_u8(SIGNED_DATA_VERSION);
                    writer.next().write_set_of(|writer| {
                        write_algorithm_identifier(writer.next(), digest_oid, false)
                    });
                    writer.next().write_sequence(|writer| {
                        writer.next().write_oid(&oid(OID_DATA));
                        if let Some(content) = content {
                            writer
                                .next()
                                .write_tagged(Tag::context(0), |writer| writer.write_bytes(content));
                        }
                    });
                    writer
                        .next()
                        .write_tagged_implicit(Tag::context(0), |writer| {
                            writer.write_set_of(|writer| writer.next().write_der(certificate.der()))
                        });
                    writer.next().write_set_of(|writer| {
                        writer.next().write_sequence(|writer| {
                            writer.next().write_u8(SIGNER_INFO_VERSION);
                            writer.next().write_sequence(|writer| {
                                writer.next().write_der(certificate.issuer());
                                writer.next().write_bigint_bytes(certificate.serial(), true);
                            });
                            write_algorithm_identifier(writer.next(), digest_oid, false);
                            writer
                                .next()
                                .write_tagged_implicit(Tag::context(0), |writer| {
                                    write_signed_attributes(writer, input, message_digest)
                                });
                            write_algorithm_identifier(
                                writer.next(),
                                algorithm.oid(),
                                algorithm.has_null_parameters(),
                            );
                            writer.next().write_bytes(signature);
                        })
                    });
                })
            });
        })
    })
}

#[derive(Debug)]
pub(crate) struct ParsedSignedData {
    pub content: Option<Vec<u8>>,
    pub certificates: Vec<Vec<u8>>,
    pub signer: ParsedSignerInfo,
}

#[derive(Debug)]
pub(crate) struct ParsedSignerInfo {
    pub digest_algorithm: Vec<u64>,
    pub signed_attributes: SignedAttributes,
    pub signature_algorithm: Vec<u64>,
    pub signature: Vec<u8>,
}

fn arcs(oid: &DerObjectIdentifier) -> Vec<u64> {
    oid.arcs().map(u64::from).collect()
}

fn octets(value: &Any) -> Result<Vec<u8>, FormatError> {
    Ok(OctetString::from_der(&value.to_der()?)?.as_bytes().to_vec())
}

impl ParsedSignerInfo {
    /// The `SET OF Attribute` that was signed
    pub fn signed_attributes_der(&self) -> Result<Vec<u8>, FormatError> {
        Ok(self.signed_attributes.to_der()?)
    }

    pub fn message_digest(&self) -> Result<Vec<u8>, FormatError> {
        let attribute = self
            .signed_attributes
            .iter()
            .find(|attribute| arcs(&attribute.oid) == OID_MESSAGE_DIGEST)
            .ok_or_else(|| {
                FormatError::InvalidStructure("missing message digest attribute".to_owned())
            })?;

        let mut values = attribute.values.iter();
        let (Some(value), None) = (values.next(), values.next()) else {
            return Err(FormatError::InvalidStructure(
                "message digest must have exactly one value".to_owned(),
            ));
        };
        octets(value)
    }
}

pub(crate) fn parse_signed_data(der: &[u8]) -> Result<ParsedSignedData, FormatError> {
    let content_info = ContentInfo::from_der(der)?;
    if arcs(&content_info.content_type) != OID_SIGNED_DATA {
        return Err(FormatError::InvalidStructure(
            "content type is not SignedData".to_owned(),
        ));
    }
    let signed_data = SignedData::from_der(&content_info.content.to_der()?)?;

    let content = match &signed_data.encap_content_info.econtent {
        Some(econtent) => Some(octets(econtent)?),
        None => None,
    };

    let certificates = signed_data
        .certificates
        .iter()
        .flat_map(|set| set.0.iter())
        .filter_map(|choice| match choice {
            CertificateChoices::Certificate(certificate) => Some(certificate.to_der()),
            _ => None,
        })
        .collect::<Result<Vec<_>, _>>()?;

    let signers: Vec<_> = signed_data.signer_infos.0.iter().collect();
    let [signer] = signers.as_slice() else {
        return Err(FormatError::InvalidStructure(format!(
            "expected exactly one signer, found {}",
            signers.len()
        )));
    };
    let signed_attributes = signer.signed_attrs.clone().ok_or_else(|| {
        FormatError::InvalidStructure("signer has no signed attributes".to_owned())
    })?;

    Ok(ParsedSignedData {
        content,
        certificates,
        signer: ParsedSignerInfo {
            digest_algorithm: arcs(&signer.digest_alg.oid),
            signed_attributes,
            signature_algorithm: arcs(&signer.signature_algorithm.oid),
            signature: signer.signature.as_bytes().to_vec(),
        },
    })
}

/// Checks a parsed container against `content` and the signer of `input`
pub(crate) fn verify_signed_data(
    crypto: &Arc<dyn CryptoProvider>,
    parsed: &ParsedSignedData,
    content: &[u8],
    input: SigningInput<'_>,
) -> Result<(), FormatError> {
    let signer = &parsed.signer;
    let expected_algorithm = input.params.algorithm;

    let algorithm = SignatureAlgorithm::from_oid(&signer.signature_algorithm)
        .ok_or_else(|| FormatError::InvalidStructure("unknown signature algorithm".to_owned()))?;
    let digest_algorithm = DigestAlgorithm::from_oid(&signer.digest_algorithm)
        .ok_or_else(|| FormatError::InvalidStructure("unknown digest algorithm".to_owned()))?;
    if algorithm != expected_algorithm || digest_algorithm != expected_algorithm.digest_algorithm()
    {
        return Err(FormatError::InvalidStructure(format!(
            "algorithm mismatch: {algorithm} / {digest_algorithm}"
        )));
    }

    if !parsed
        .certificates
        .iter()
        .any(|certificate| certificate.as_slice() == input.certificate.der())
    {
        return Err(FormatError::InvalidStructure(
            "signer certificate not included".to_owned(),
        ));
    }

    let content_digest = crypto.get_hasher(digest_algorithm)?.hash(content);
    if signer.message_digest()? != content_digest {
        return Err(FormatError::InvalidStructure(
            "message digest does not match the content".to_owned(),
        ));
    }

    verify_signature(
        crypto,
        algorithm,
        &signer.signed_attributes_der()?,
        &signer.signature,
        input.certificate,
    )
}
