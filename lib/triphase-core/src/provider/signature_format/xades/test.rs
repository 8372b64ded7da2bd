use rstest::rstest;

use super::XAdESFormatter;
use crate::model::job::{SignatureFormat, SignatureMode};
use crate::provider::signature_format::SignatureFormatter;
use crate::provider::signature_format::error::FormatError;
use crate::test_utilities::*;

const DOCUMENT: &[u8] = b"<invoice><amount>42</amount></invoice>";

fn assembled(signer: &TestSigner, mode: SignatureMode) -> (Vec<u8>, Vec<u8>) {
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(signer, SignatureFormat::XAdES, mode, DOCUMENT);
    let input = signing_input(signer, &params, DOCUMENT);

    let pre_sign = formatter.pre_sign(input).unwrap();
    let signed = formatter.assemble(input, &signer.sign(&pre_sign)).unwrap();
    (pre_sign, signed)
}

#[rstest]
#[case::ecdsa_implicit(TestSigner::ecdsa(), SignatureMode::Implicit)]
#[case::ecdsa_explicit(TestSigner::ecdsa(), SignatureMode::Explicit)]
#[case::rsa_implicit(TestSigner::rsa(), SignatureMode::Implicit)]
fn test_xades_sign_and_validate(#[case] signer: TestSigner, #[case] mode: SignatureMode) {
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(&signer, SignatureFormat::XAdES, mode, DOCUMENT);
    let (pre_sign, signed) = assembled(&signer, mode);

    formatter
        .validate(&signed, signing_input(&signer, &params, DOCUMENT))
        .unwrap();

    let xml = String::from_utf8(signed).unwrap();
    let signed_info = String::from_utf8(pre_sign).unwrap();
    // inside the document the ds prefix is declared once, on ds:Signature
    let embedded = signed_info.replacen(r#" xmlns:ds="http://www.w3.org/2000/09/xmldsig#""#, "", 1);
    assert!(xml.contains(&embedded));
    assert!(xml.contains("<xades:SigningTime>2024-05-06T07:08:09Z</xades:SigningTime>"));
    assert!(xml.contains(signer.algorithm.xml_uri()));
    assert_eq!(xml.contains(r#"Id="Object""#), mode == SignatureMode::Implicit);
}

#[test]
fn test_xades_signed_info_structure() {
    let signer = TestSigner::ecdsa();
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(&signer, SignatureFormat::XAdES, SignatureMode::Implicit, DOCUMENT);

    let pre_sign = formatter
        .pre_sign(signing_input(&signer, &params, DOCUMENT))
        .unwrap();
    let signed_info = String::from_utf8(pre_sign).unwrap();

    assert!(signed_info.starts_with(r#"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#));
    assert!(signed_info.contains(r##"URI="#Object""##));
    assert!(signed_info.contains(r##"URI="#SignedProperties""##));
    assert!(signed_info.ends_with("</ds:SignedInfo>"));
}

#[test]
fn test_xades_rejects_modified_document() {
    let signer = TestSigner::ecdsa();
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(&signer, SignatureFormat::XAdES, SignatureMode::Explicit, DOCUMENT);
    let (_, signed) = assembled(&signer, SignatureMode::Explicit);

    let result = formatter.validate(
        &signed,
        signing_input(&signer, &params, b"<invoice><amount>43</amount></invoice>"),
    );
    assert!(matches!(result, Err(FormatError::InvalidStructure(_))));
}

#[test]
fn test_xades_rejects_wrong_signature() {
    let signer = TestSigner::ecdsa();
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(&signer, SignatureFormat::XAdES, SignatureMode::Implicit, DOCUMENT);
    let input = signing_input(&signer, &params, DOCUMENT);

    let signed = formatter
        .assemble(input, &signer.sign(b"unrelated"))
        .unwrap();

    assert!(matches!(
        formatter.validate(&signed, input),
        Err(FormatError::InvalidSignature)
    ));
}

#[test]
fn test_xades_rejects_truncated_document() {
    let signer = TestSigner::ecdsa();
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(&signer, SignatureFormat::XAdES, SignatureMode::Implicit, DOCUMENT);
    let (_, signed) = assembled(&signer, SignatureMode::Implicit);

    let truncated = &signed[..signed.len() / 3];
    assert!(
        formatter
            .validate(truncated, signing_input(&signer, &params, DOCUMENT))
            .is_err()
    );
}

#[test]
fn test_xades_accepts_equivalent_serialization() {
    let signer = TestSigner::ecdsa();
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(&signer, SignatureFormat::XAdES, SignatureMode::Implicit, DOCUMENT);
    let (_, signed) = assembled(&signer, SignatureMode::Implicit);

    let xml = String::from_utf8(signed).unwrap();
    let signature_method = format!(
        r#"<ds:SignatureMethod Algorithm="{}"></ds:SignatureMethod>"#,
        signer.algorithm.xml_uri()
    );
    assert!(xml.contains(&signature_method));

    // single quotes, reordered and unused declarations, self-closing tags, line breaks
    let rewritten = xml
        .replacen(
            r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#" Id="Signature">"#,
            "<ds:Signature Id='Signature' xmlns:unused='urn:unused'\n    xmlns:ds='http://www.w3.org/2000/09/xmldsig#'>",
            1,
        )
        .replacen(
            &signature_method,
            &format!("<ds:SignatureMethod Algorithm='{}' />", signer.algorithm.xml_uri()),
            1,
        );
    assert_ne!(rewritten, xml);

    formatter
        .validate(rewritten.as_bytes(), signing_input(&signer, &params, DOCUMENT))
        .unwrap();
}

#[test]
fn test_xades_rejects_duplicate_ids() {
    let signer = TestSigner::ecdsa();
    let formatter = XAdESFormatter::new(crypto());
    let params = signature_params(&signer, SignatureFormat::XAdES, SignatureMode::Implicit, DOCUMENT);
    let (_, signed) = assembled(&signer, SignatureMode::Implicit);

    let xml = String::from_utf8(signed).unwrap().replacen(
        "</ds:Signature>",
        r#"<ds:Object Id="SignedProperties">forged</ds:Object></ds:Signature>"#,
        1,
    );

    let result = formatter.validate(xml.as_bytes(), signing_input(&signer, &params, DOCUMENT));
    assert!(matches!(result, Err(FormatError::InvalidStructure(message)) if message.contains("duplicate ID")));
}

#[test]
fn test_xades_content_description_is_signed() {
    let signer = TestSigner::rsa();
    let formatter = XAdESFormatter::new(crypto());
    let plain = signature_params(&signer, SignatureFormat::XAdES, SignatureMode::Explicit, DOCUMENT);
    let mut described = plain.clone();
    described.content_description = Some("Quarterly <invoice>".to_owned());
    let input = signing_input(&signer, &described, DOCUMENT);

    let pre_sign = formatter.pre_sign(input).unwrap();
    assert_ne!(
        pre_sign,
        formatter
            .pre_sign(signing_input(&signer, &plain, DOCUMENT))
            .unwrap()
    );

    let signed = formatter.assemble(input, &signer.sign(&pre_sign)).unwrap();
    formatter.validate(&signed, input).unwrap();

    let xml = String::from_utf8(signed).unwrap();
    assert!(xml.contains(r##"<xades:DataObjectFormat ObjectReference="#DocumentReference">"##));
    assert!(xml.contains("<xades:Description>Quarterly &lt;invoice&gt;</xades:Description>"));
    assert!(xml.contains(r#"<ds:Reference Id="DocumentReference">"#));
}
