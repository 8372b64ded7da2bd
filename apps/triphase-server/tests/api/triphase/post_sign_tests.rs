use serde_json::{Value, json};

use crate::utils::context::TestContext;
use crate::utils::signer::ClientSigner;
use crate::utils::{decode, encode};

async fn pre_sign(context: &TestContext, signer: &ClientSigner, documents: Value) -> Value {
    let resp = context
        .api
        .pre_sign(json!({
            "format": "CAdES",
            "algorithm": "SHA256withECDSA",
            "certificate": signer.certificate(),
            "documents": documents
        }))
        .await;
    assert_eq!(resp.status(), 200);
    resp.json_value().await
}

#[tokio::test]
async fn test_pre_sign_sign_post_sign() {
    // GIVEN
    let context = TestContext::new().await;
    let signer = ClientSigner::new();
    let reference = encode(b"doc-1");

    let pre = pre_sign(&context, &signer, json!([{ "reference": reference }])).await;
    let pre_sign_bytes = pre["results"][0]["artifact"]["preSign"].as_str().unwrap();

    // WHEN
    let request = json!({
        "sessionId": pre["sessionId"],
        "documents": [{
            "reference": reference,
            "signature": signer.sign(pre_sign_bytes),
        }]
    });
    let resp = context.api.post_sign(request.clone()).await;

    // THEN
    assert_eq!(resp.status(), 200);
    let body = resp.json_value().await;
    assert_eq!(body["sessionId"], pre["sessionId"]);
    assert_eq!(body["results"][0]["status"], "OK");

    let content = body["results"][0]["document"]["content"].as_str().unwrap();
    assert!(!decode(content).is_empty());

    // repeating the request returns the same signed document
    let resp = context.api.post_sign(request).await;
    assert_eq!(resp.status(), 200);
    let repeated = resp.json_value().await;
    assert_eq!(repeated["results"][0]["document"]["content"], content);
}

#[tokio::test]
async fn test_post_sign_xades_detached() {
    // GIVEN
    let context = TestContext::new().await;
    let signer = ClientSigner::new();
    let reference = encode(b"<invoice>42</invoice>");

    let pre = pre_sign(
        &context,
        &signer,
        json!([{
            "reference": reference,
            "settings": { "format": "XAdES", "mode": "EXPLICIT", "contentDescription": "invoice" }
        }]),
    )
    .await;
    let pre_sign_bytes = pre["results"][0]["artifact"]["preSign"].as_str().unwrap();

    // WHEN
    let resp = context
        .api
        .post_sign(json!({
            "sessionId": pre["sessionId"],
            "documents": [{
                "reference": reference,
                "signature": signer.sign(pre_sign_bytes),
            }]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 200);
    let body = resp.json_value().await;
    assert_eq!(body["results"][0]["status"], "OK");

    let content = decode(body["results"][0]["document"]["content"].as_str().unwrap());
    let xml = String::from_utf8(content).unwrap();
    assert!(xml.contains("<ds:Signature"));
    assert!(xml.contains("<xades:Description>invoice</xades:Description>"));
    assert!(!xml.contains("MimeType=\"application/octet-stream\""));
}

#[tokio::test]
async fn test_post_sign_invalid_signature_can_be_retried() {
    // GIVEN
    let context = TestContext::new().await;
    let signer = ClientSigner::new();
    let other_signer = ClientSigner::new();
    let reference = encode(b"doc-1");

    let pre = pre_sign(&context, &signer, json!([{ "reference": reference }])).await;
    let pre_sign_bytes = pre["results"][0]["artifact"]["preSign"].as_str().unwrap();

    // WHEN
    let resp = context
        .api
        .post_sign(json!({
            "sessionId": pre["sessionId"],
            "documents": [{
                "reference": reference,
                "signature": other_signer.sign(pre_sign_bytes),
            }]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 200);
    let body = resp.json_value().await;
    assert_eq!(body["results"][0]["status"], "ERROR");
    assert_eq!(body["results"][0]["error"]["code"], "BR_0012");
    assert_eq!(body["results"][0]["error"]["kind"], "InvalidSignatureError");

    let resp = context
        .api
        .post_sign(json!({
            "sessionId": pre["sessionId"],
            "documents": [{
                "reference": reference,
                "signature": signer.sign(pre_sign_bytes),
            }]
        }))
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json_value().await["results"][0]["status"], "OK");
}

#[tokio::test]
async fn test_post_sign_unknown_session() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context
        .api
        .post_sign(json!({
            "sessionId": "8f6c6a8e-3a4b-4d4e-9d55-0c5b7a1e2f3d",
            "documents": [{ "reference": encode(b"doc-1"), "signature": encode(b"signature") }]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.json_value().await["code"], "BR_0005");
}

#[tokio::test]
async fn test_post_sign_signature_not_base64() {
    // GIVEN
    let context = TestContext::new().await;
    let signer = ClientSigner::new();
    let reference = encode(b"doc-1");
    let pre = pre_sign(&context, &signer, json!([{ "reference": reference }])).await;

    // WHEN
    let resp = context
        .api
        .post_sign(json!({
            "sessionId": pre["sessionId"],
            "documents": [{ "reference": reference, "signature": "*not-base64*" }]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 400);
    let body = resp.json_value().await;
    assert_eq!(body["code"], "BR_0020");
    assert!(
        body["cause"]["message"]
            .as_str()
            .unwrap()
            .contains("documents[0].signature")
    );
}
