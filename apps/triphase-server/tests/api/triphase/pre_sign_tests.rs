use serde_json::json;

use crate::utils::context::{ALLOW_ORIGIN, TestContext};
use crate::utils::encode;
use crate::utils::signer::ClientSigner;

#[tokio::test]
async fn test_pre_sign_reports_every_document_in_order() {
    // GIVEN
    let context = TestContext::new().await;
    let signer = ClientSigner::new();

    // WHEN
    let resp = context
        .api
        .pre_sign(json!({
            "format": "CAdES",
            "algorithm": "SHA256withECDSA",
            "certificate": signer.certificate(),
            "documents": [
                { "reference": encode(b"first document") },
                { "reference": "not base64url!" },
                { "reference": encode(b"third document") },
            ]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.header("access-control-allow-origin").as_deref(), Some(ALLOW_ORIGIN));

    let body = resp.json_value().await;
    assert!(body["sessionId"].is_string());

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0]["index"], 0);
    assert_eq!(results[0]["status"], "OK");
    assert_eq!(results[0]["artifact"]["digestAlgorithm"], "SHA-256");
    assert!(results[0]["artifact"]["preSign"].is_string());
    assert!(results[0]["error"].is_null());

    assert_eq!(results[1]["index"], 1);
    assert_eq!(results[1]["status"], "ERROR");
    assert_eq!(results[1]["error"]["code"], "BR_0010");
    assert_eq!(results[1]["error"]["kind"], "ResolutionError");
    assert!(results[1]["artifact"].is_null());

    assert_eq!(results[2]["index"], 2);
    assert_eq!(results[2]["status"], "OK");
}

#[tokio::test]
async fn test_pre_sign_unknown_format_fails_only_that_document() {
    // GIVEN
    let context = TestContext::new().await;
    let signer = ClientSigner::new();

    // WHEN
    let resp = context
        .api
        .pre_sign(json!({
            "format": "CAdES",
            "algorithm": "SHA256withECDSA",
            "certificate": signer.certificate(),
            "documents": [
                { "reference": encode(b"document"), "settings": { "format": "JAdES" } },
                { "reference": encode(b"<doc/>"), "settings": { "format": "XAdES", "mode": "EXPLICIT" } },
            ]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 200);
    let body = resp.json_value().await;
    assert_eq!(body["results"][0]["status"], "ERROR");
    assert_eq!(body["results"][0]["error"]["code"], "BR_0011");
    assert_eq!(body["results"][0]["error"]["kind"], "UnsupportedFormatError");
    assert_eq!(body["results"][1]["status"], "OK");
}

#[tokio::test]
async fn test_pre_sign_empty_document_list() {
    // GIVEN
    let context = TestContext::new().await;
    let signer = ClientSigner::new();

    // WHEN
    let resp = context
        .api
        .pre_sign(json!({
            "format": "CAdES",
            "algorithm": "SHA256withECDSA",
            "certificate": signer.certificate(),
            "documents": []
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0003");
}

#[tokio::test]
async fn test_pre_sign_invalid_certificate() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context
        .api
        .pre_sign(json!({
            "format": "CAdES",
            "algorithm": "SHA256withECDSA",
            "certificate": encode(b"not a certificate"),
            "documents": [{ "reference": encode(b"document") }]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0004");
}

#[tokio::test]
async fn test_pre_sign_certificate_not_base64() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context
        .api
        .pre_sign(json!({
            "format": "CAdES",
            "algorithm": "SHA256withECDSA",
            "certificate": "%%%",
            "documents": [{ "reference": encode(b"document") }]
        }))
        .await;

    // THEN
    assert_eq!(resp.status(), 400);
    let body = resp.json_value().await;
    assert_eq!(body["code"], "BR_0020");
    assert!(body["cause"]["message"].as_str().unwrap().contains("certificate"));
}

#[tokio::test]
async fn test_pre_sign_malformed_body() {
    // GIVEN
    let context = TestContext::new().await;
    let body = b"{\"format\": ".to_vec();
    let tag = context.api.tag(&body);

    // WHEN
    let resp = context
        .api
        .post_raw("/api/triphase/v1/pre-sign", body, tag.as_deref())
        .await;

    // THEN
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json_value().await["code"], "BR_0020");
}
