use indoc::indoc;
use serde_json::json;

use crate::utils::context::{ALLOW_ORIGIN, TestContext};
use crate::utils::encode;
use crate::utils::signer::ClientSigner;

fn pre_sign_body(signer: &ClientSigner) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "format": "CAdES",
        "algorithm": "SHA256withECDSA",
        "certificate": signer.certificate(),
        "documents": [{ "reference": encode(b"doc-1") }]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_missing_tag_is_rejected() {
    // GIVEN
    let context = TestContext::new().await;
    let body = pre_sign_body(&ClientSigner::new());

    // WHEN
    let resp = context
        .api
        .post_raw("/api/triphase/v1/pre-sign", body, None)
        .await;

    // THEN
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.header("access-control-allow-origin").as_deref(), Some(ALLOW_ORIGIN));
    assert_eq!(resp.json_value().await["code"], "BR_0002");
}

#[tokio::test]
async fn test_tag_of_other_payload_is_rejected() {
    // GIVEN
    let context = TestContext::new().await;
    let body = pre_sign_body(&ClientSigner::new());
    let tag = context.api.tag(b"{}").unwrap();

    // WHEN
    let resp = context
        .api
        .post_raw("/api/triphase/v1/post-sign", body, Some(&tag))
        .await;

    // THEN
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.json_value().await["code"], "BR_0002");
}

#[tokio::test]
async fn test_malformed_tag_is_rejected() {
    // GIVEN
    let context = TestContext::new().await;
    let body = pre_sign_body(&ClientSigner::new());

    // WHEN
    let resp = context
        .api
        .post_raw("/api/triphase/v1/pre-sign", body, Some("not-hex"))
        .await;

    // THEN
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_requests_accepted_without_verification_key() {
    // GIVEN
    let context = TestContext::new_with_properties(
        indoc! {"
            document.manager=inline
            verification.key=
        "},
        None,
    )
    .await;
    let body = pre_sign_body(&ClientSigner::new());

    // WHEN
    let resp = context
        .api
        .post_raw("/api/triphase/v1/pre-sign", body, None)
        .await;

    // THEN
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.header("access-control-allow-origin").as_deref(), Some("*"));
    assert_eq!(resp.json_value().await["results"][0]["status"], "OK");
}
