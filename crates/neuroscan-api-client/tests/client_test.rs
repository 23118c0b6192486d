use mockito::Matcher;
use neuroscan_api_client::{ApiClient, RequestBody, UploadPart, MALFORMED_RESPONSE};
use neuroscan_core::ClientConfig;
use serde_json::json;

fn client_for(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(ClientConfig::new(format!("{}/api", server.url()))).unwrap()
}

fn png(name: &str) -> UploadPart {
    UploadPart {
        filename: name.to_string(),
        content_type: "image/png".to_string(),
        bytes: bytes::Bytes::from_static(b"fake-png-payload"),
    }
}

#[tokio::test]
async fn get_attaches_bearer_token_and_decodes_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/get-predictions/user-1")
        .match_header("authorization", "Bearer token-abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"timestamp":"2024-05-01T10:00:00","userId":"user-1","batchId":"b1",
                "predictions":[{"filename":"a.png","hasTumor":true}]}]"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client.get_predictions("user-1", "token-abc").await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    let history = response.data.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].predictions[0].filename, "a.png");
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/health")
        .match_header("authorization", Matcher::Missing)
        .match_query(Matcher::UrlEncoded("verbose".into(), "1".into()))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response: neuroscan_api_client::ApiResponse<serde_json::Value> = client
        .get("/health", None, &[("verbose", "1".to_string())])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.data.unwrap()["ok"], true);
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/get-predictions/user-1")
        .with_status(404)
        .with_body(r#"{"message":"No predictions found"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client.get_predictions("user-1", "t").await.unwrap();

    assert_eq!(response.status, 404);
    assert!(response.data.is_none());
    assert_eq!(response.message.as_deref(), Some("No predictions found"));
    assert!(!response.is_success());
}

#[tokio::test]
async fn malformed_success_body_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/model-info/user-1")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.model_info("user-1", "t").await.unwrap_err();

    assert_eq!(err.status, Some(200));
    assert_eq!(err.code.as_deref(), Some(MALFORMED_RESPONSE));
}

#[tokio::test]
async fn json_body_sets_json_content_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/settings")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"threshold": 0.5})))
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    let response: neuroscan_api_client::ApiResponse<()> = client
        .put(
            "/settings",
            Some("t"),
            Some(RequestBody::json(&json!({"threshold": 0.5})).unwrap()),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 204);
    assert!(response.is_success());
}

#[tokio::test]
async fn predict_sends_multipart_without_json_content_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/predict/user-1")
        .match_header("authorization", "Bearer t")
        .match_header(
            "content-type",
            Matcher::Regex(r"^multipart/form-data; boundary=.+$".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="batchId"\r\n\r\nbatch-42"#.to_string()),
            Matcher::Regex(r#"name="images"; filename="a.png""#.to_string()),
            Matcher::Regex(r#"name="images"; filename="b.png""#.to_string()),
            Matcher::Regex("(?i)content-type: image/png".to_string()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"timestamp":"2024-05-01T10:00:00","userId":"user-1","batchId":"batch-42",
                "predictions":[{"filename":"a.png","hasTumor":false},{"filename":"b.png","hasTumor":true}]}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .predict("user-1", "t", "batch-42", &[png("a.png"), png("b.png")])
        .await
        .unwrap();

    mock.assert_async().await;
    let batch = response.data.unwrap();
    assert_eq!(batch.batch_id.as_deref(), Some("batch-42"));
    assert_eq!(batch.tumor_count(), 1);
}

#[tokio::test]
async fn patch_and_delete_use_their_methods() {
    let mut server = mockito::Server::new_async().await;
    let patch = server
        .mock("PATCH", "/api/items/1")
        .with_status(200)
        .with_body(r#"{"id":1}"#)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/api/items/1")
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let client = client_for(&server);
    let patched: neuroscan_api_client::ApiResponse<serde_json::Value> = client
        .patch("/items/1", None, Some(json!({"name": "x"}).into()))
        .await
        .unwrap();
    let deleted: neuroscan_api_client::ApiResponse<Option<serde_json::Value>> =
        client.delete("/items/1", None, None).await.unwrap();

    patch.assert_async().await;
    delete.assert_async().await;
    assert_eq!(patched.data.unwrap()["id"], 1);
    assert_eq!(deleted.data, Some(None));
}

#[tokio::test]
async fn connection_failure_is_normalized() {
    // Nothing listens on port 1.
    let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:1/api")).unwrap();
    let err = client.get_predictions("user-1", "t").await.unwrap_err();

    assert!(err.is_transport());
    assert!(err.code.is_some());
    assert!(!err.message.is_empty());
}
