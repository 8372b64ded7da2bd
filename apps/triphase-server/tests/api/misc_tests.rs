use crate::utils::context::{ALLOW_ORIGIN, TestContext};

#[tokio::test]
async fn test_health_check() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.get("/health").await;

    // THEN
    assert_eq!(resp.status(), 204);
    assert_eq!(resp.header("access-control-allow-origin").as_deref(), Some(ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_openapi_documents_triphase_endpoints() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.get("/api-docs/openapi.json").await;

    // THEN
    assert_eq!(resp.status(), 200);
    let body = resp.json_value().await;
    assert!(body["paths"]["/api/triphase/v1/pre-sign"]["post"].is_object());
    assert!(body["paths"]["/api/triphase/v1/post-sign"]["post"].is_object());
    assert!(body["components"]["schemas"]["ErrorCode"].is_object());
}
