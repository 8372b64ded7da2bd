//! Enveloping and detached XAdES-BES.
//!
//! Signed fragments are built as XML trees and digested in exclusive canonical form;
//! validation parses the document and canonicalizes what it finds there.

use std::sync::Arc;

use ct_codecs::{Base64, Decoder, Encoder};
use time::format_description::well_known::Rfc3339;
use triphase_crypto::CryptoProvider;
use triphase_crypto::hasher::DigestAlgorithm;
use triphase_crypto::signer::SignatureAlgorithm;

use self::xml::{Element, Scope, canonicalize, parse};
use super::error::FormatError;
use super::{SignatureFormatter, SigningInput, verify_signature, xml_signature_value};
use crate::model::job::SignatureMode;

mod xml;

#[cfg(test)]
mod test;

const NS_DS: &str = "http://www.w3.org/2000/09/xmldsig#";
const NS_XADES: &str = "http://uri.etsi.org/01903/v1.3.2#";
const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
const BASE64_TRANSFORM: &str = "http://www.w3.org/2000/09/xmldsig#base64";
const SIGNED_PROPERTIES_TYPE: &str = "http://uri.etsi.org/01903#SignedProperties";

const SIGNATURE_ID: &str = "Signature";
const SIGNED_PROPERTIES_ID: &str = "SignedProperties";
const DOCUMENT_REFERENCE_ID: &str = "DocumentReference";
const OBJECT_ID: &str = "Object";

const XML_DECLARATION: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>"#;
const BASE64_IGNORED: &[u8] = b" \t\r\n";

pub struct XAdESFormatter {
    crypto: Arc<dyn CryptoProvider>,
}

/// Namespaces in scope for every fragment of the assembled signature
fn signature_scope() -> Scope {
    Scope::from([
        ("ds".to_owned(), NS_DS.to_owned()),
        ("xades".to_owned(), NS_XADES.to_owned()),
    ])
}

fn digest_method(algorithm: DigestAlgorithm) -> Element {
    Element::new("ds:DigestMethod").with_attribute("Algorithm", algorithm.xml_uri())
}

fn digest_value(digest: &[u8]) -> Result<Element, FormatError> {
    Ok(Element::new("ds:DigestValue").with_text(Base64::encode_to_string(digest)?))
}

fn transforms(algorithm: &str) -> Element {
    Element::new("ds:Transforms")
        .with_child(Element::new("ds:Transform").with_attribute("Algorithm", algorithm))
}

fn structure(message: impl Into<String>) -> FormatError {
    FormatError::InvalidStructure(message.into())
}

fn missing(what: &str) -> FormatError {
    structure(format!("missing {what}"))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, FormatError> {
    Ok(Base64::decode_to_vec(text, Some(BASE64_IGNORED))?)
}

/// Octets a reference digests, and the element it points to
struct Dereferenced<'a> {
    data: Vec<u8>,
    target: Option<(&'a Element, Scope)>,
}

impl XAdESFormatter {
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { crypto }
    }

    fn hash(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>, FormatError> {
        Ok(self.crypto.get_hasher(algorithm)?.hash(data))
    }

    fn signed_properties(&self, input: SigningInput<'_>) -> Result<Element, FormatError> {
        let signing_time = input
            .params
            .signing_time
            .format(&Rfc3339)
            .map_err(|e| FormatError::Encoding(e.to_string()))?;

        let certificate_digest = Element::new("xades:CertDigest")
            .with_child(digest_method(DigestAlgorithm::Sha256))
            .with_child(digest_value(&input.params.certificate_digest)?);

        let mut properties = Element::new("xades:SignedProperties")
            .with_attribute("Id", SIGNED_PROPERTIES_ID)
            .with_child(
                Element::new("xades:SignedSignatureProperties")
                    .with_child(Element::new("xades:SigningTime").with_text(signing_time))
                    .with_child(
                        Element::new("xades:SigningCertificateV2")
                            .with_child(Element::new("xades:Cert").with_child(certificate_digest)),
                    ),
            );

        if let Some(description) = &input.params.content_description {
            properties = properties.with_child(
                Element::new("xades:SignedDataObjectProperties").with_child(
                    Element::new("xades:DataObjectFormat")
                        .with_attribute("ObjectReference", &format!("#{DOCUMENT_REFERENCE_ID}"))
                        .with_child(
                            Element::new("xades:Description").with_text(description.as_str()),
                        ),
                ),
            );
        }

        Ok(properties)
    }

    fn signed_info(
        &self,
        input: SigningInput<'_>,
        signed_properties: &Element,
    ) -> Result<Element, FormatError> {
        let algorithm = input.params.algorithm;
        let digest = algorithm.digest_algorithm();
        let properties_digest =
            self.hash(digest, &canonicalize(signed_properties, &signature_scope()))?;

        let mut document_reference =
            Element::new("ds:Reference").with_attribute("Id", DOCUMENT_REFERENCE_ID);
        // without a URI the detached document is resolved by the application
        if input.params.mode == SignatureMode::Implicit {
            document_reference = document_reference
                .with_attribute("URI", &format!("#{OBJECT_ID}"))
                .with_child(transforms(BASE64_TRANSFORM));
        }
        let document_reference = document_reference
            .with_child(digest_method(digest))
            .with_child(digest_value(&input.params.document_digest)?);

        let properties_reference = Element::new("ds:Reference")
            .with_attribute("Type", SIGNED_PROPERTIES_TYPE)
            .with_attribute("URI", &format!("#{SIGNED_PROPERTIES_ID}"))
            .with_child(transforms(EXC_C14N))
            .with_child(digest_method(digest))
            .with_child(digest_value(&properties_digest)?);

        Ok(Element::new("ds:SignedInfo")
            .with_child(
                Element::new("ds:CanonicalizationMethod").with_attribute("Algorithm", EXC_C14N),
            )
            .with_child(
                Element::new("ds:SignatureMethod").with_attribute("Algorithm", algorithm.xml_uri()),
            )
            .with_child(document_reference)
            .with_child(properties_reference))
    }

    fn dereference<'a>(
        &self,
        root: &'a Element,
        root_scope: &Scope,
        reference: &Element,
        reference_scope: &Scope,
        input: SigningInput<'_>,
    ) -> Result<Dereferenced<'a>, FormatError> {
        let algorithms: Vec<&str> = reference
            .child(reference_scope, NS_DS, "Transforms")
            .map(|(transforms, scope)| {
                transforms
                    .child_elements()
                    .filter(|transform| transform.is(&transform.scope(&scope), NS_DS, "Transform"))
                    .filter_map(|transform| transform.attribute("Algorithm"))
                    .collect()
            })
            .unwrap_or_default();

        let Some(uri) = reference.attribute("URI") else {
            if !algorithms.is_empty() {
                return Err(structure("transforms on a detached reference"));
            }
            return Ok(Dereferenced {
                data: input.document.to_vec(),
                target: None,
            });
        };

        let id = uri
            .strip_prefix('#')
            .ok_or_else(|| structure(format!("unsupported reference `{uri}`")))?;
        let mut targets = root
            .descendants(root_scope)
            .into_iter()
            .filter(|(element, _)| element.attribute("Id") == Some(id));
        let (target, target_scope) = targets.next().ok_or_else(|| missing(uri))?;
        if targets.next().is_some() {
            return Err(structure(format!("duplicate ID `{id}`")));
        }

        let data = match algorithms.as_slice() {
            [BASE64_TRANSFORM] => decode_base64(&target.text())?,
            [EXC_C14N] => canonicalize(target, &target_scope),
            _ => return Err(structure(format!("unsupported transforms for `{uri}`"))),
        };

        Ok(Dereferenced {
            data,
            target: Some((target, target_scope)),
        })
    }
}

impl SignatureFormatter for XAdESFormatter {
    fn pre_sign(&self, input: SigningInput<'_>) -> Result<Vec<u8>, FormatError> {
        let signed_properties = self.signed_properties(input)?;
        let signed_info = self.signed_info(input, &signed_properties)?;
        Ok(canonicalize(&signed_info, &signature_scope()))
    }

    fn assemble(&self, input: SigningInput<'_>, signature: &[u8]) -> Result<Vec<u8>, FormatError> {
        let signed_properties = self.signed_properties(input)?;
        let signed_info = self.signed_info(input, &signed_properties)?;
        let signature_value =
            Base64::encode_to_string(xml_signature_value(input.params.algorithm, signature)?)?;
        let certificate = Base64::encode_to_string(input.certificate.der())?;

        let qualifying_properties = Element::new("xades:QualifyingProperties")
            .with_namespace("xades", NS_XADES)
            .with_attribute("Target", &format!("#{SIGNATURE_ID}"))
            .with_child(signed_properties);

        let mut signature = Element::new("ds:Signature")
            .with_namespace("ds", NS_DS)
            .with_attribute("Id", SIGNATURE_ID)
            .with_child(signed_info)
            .with_child(Element::new("ds:SignatureValue").with_text(signature_value))
            .with_child(
                Element::new("ds:KeyInfo").with_child(
                    Element::new("ds:X509Data")
                        .with_child(Element::new("ds:X509Certificate").with_text(certificate)),
                ),
            )
            .with_child(Element::new("ds:Object").with_child(qualifying_properties));

        if input.params.mode == SignatureMode::Implicit {
            signature = signature.with_child(
                Element::new("ds:Object")
                    .with_attribute("Encoding", BASE64_TRANSFORM)
                    .with_attribute("Id", OBJECT_ID)
                    .with_attribute("MimeType", "application/octet-stream")
                    .with_text(Base64::encode_to_string(input.document)?),
            );
        }

        let mut document = XML_DECLARATION.to_vec();
        document.extend(canonicalize(&signature, &signature.scope(&Scope::new())));
        Ok(document)
    }

    fn validate(&self, signed: &[u8], input: SigningInput<'_>) -> Result<(), FormatError> {
        let root = parse(signed)?;
        let root_scope = root.scope(&Scope::new());
        if !root.is(&root_scope, NS_DS, "Signature") {
            return Err(structure("document element is not ds:Signature"));
        }

        let (signed_info, signed_info_scope) = root
            .child(&root_scope, NS_DS, "SignedInfo")
            .ok_or_else(|| missing("ds:SignedInfo"))?;

        let canonicalization = signed_info
            .child(&signed_info_scope, NS_DS, "CanonicalizationMethod")
            .and_then(|(method, _)| method.attribute("Algorithm"));
        if canonicalization != Some(EXC_C14N) {
            return Err(structure("unsupported canonicalization method"));
        }

        let algorithm = signed_info
            .child(&signed_info_scope, NS_DS, "SignatureMethod")
            .and_then(|(method, _)| method.attribute("Algorithm"))
            .and_then(SignatureAlgorithm::from_xml_uri)
            .ok_or_else(|| missing("signature method"))?;
        if algorithm != input.params.algorithm {
            return Err(structure(format!("unexpected signature method `{algorithm}`")));
        }

        let certificate = root
            .descendants(&root_scope)
            .into_iter()
            .find(|(element, scope)| element.is(scope, NS_DS, "X509Certificate"))
            .ok_or_else(|| missing("ds:X509Certificate"))?;
        if decode_base64(&certificate.0.text())? != input.certificate.der() {
            return Err(structure("unexpected signer certificate"));
        }

        let mut document_references = 0;
        let mut properties_references = 0;
        for reference in signed_info.child_elements() {
            let reference_scope = reference.scope(&signed_info_scope);
            if !reference.is(&reference_scope, NS_DS, "Reference") {
                continue;
            }

            let dereferenced =
                self.dereference(&root, &root_scope, reference, &reference_scope, input)?;

            if reference.attribute("Type") == Some(SIGNED_PROPERTIES_TYPE) {
                let is_signed_properties = dereferenced.target.as_ref().is_some_and(
                    |(target, scope)| target.is(scope, NS_XADES, "SignedProperties"),
                );
                if !is_signed_properties {
                    return Err(structure("signed properties reference has the wrong target"));
                }
                properties_references += 1;
            } else {
                let embedded = dereferenced.target.is_some();
                if embedded != (input.params.mode == SignatureMode::Implicit) {
                    return Err(structure(format!(
                        "document reference does not match signature mode `{}`",
                        input.params.mode
                    )));
                }
                document_references += 1;
            }

            let digest = reference
                .child(&reference_scope, NS_DS, "DigestMethod")
                .and_then(|(method, _)| method.attribute("Algorithm"))
                .and_then(DigestAlgorithm::from_xml_uri)
                .ok_or_else(|| missing("digest method"))?;
            let expected = reference
                .child(&reference_scope, NS_DS, "DigestValue")
                .map(|(value, _)| value.text())
                .ok_or_else(|| missing("digest value"))?;
            if self.hash(digest, &dereferenced.data)? != decode_base64(&expected)? {
                return Err(structure("reference digest mismatch"));
            }
        }
        if (document_references, properties_references) != (1, 1) {
            return Err(structure(
                "expected one document reference and one signed properties reference",
            ));
        }

        let signature_value = root
            .child(&root_scope, NS_DS, "SignatureValue")
            .map(|(value, _)| value.text())
            .ok_or_else(|| missing("ds:SignatureValue"))?;
        verify_signature(
            &self.crypto,
            algorithm,
            &canonicalize(signed_info, &signed_info_scope),
            &decode_base64(&signature_value)?,
            input.certificate,
        )
    }
}
