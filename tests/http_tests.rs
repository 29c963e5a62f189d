use anyhow::Result;
use m365ctl::error::CommandError;
use m365ctl::http::{HttpClient, RequestOptions};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::time::Duration;

fn client() -> Result<HttpClient> {
    HttpClient::new(Duration::from_secs(5), Some("token-123".to_string()))
}

#[tokio::test]
async fn test_bearer_token_and_headers_are_sent() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1.0/me")
        .match_header("authorization", "Bearer token-123")
        .match_header("accept", "application/json;odata=nometadata")
        .with_status(200)
        .with_body(json!({"displayName": "Megan"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let me = client()?
        .get_json(
            RequestOptions::new(format!("{}/v1.0/me", server.url()))
                .header("Accept", "application/json;odata=nometadata"),
        )
        .await?;

    assert_eq!(me["displayName"], "Megan");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_anonymous_request_has_no_token() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/blob")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("bytes")
        .expect(1)
        .create_async()
        .await;

    let body = client()?
        .get_bytes(RequestOptions::new(format!("{}/blob", server.url())).anonymous())
        .await?;

    assert_eq!(body, b"bytes");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_empty_body_is_null() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/action")
        .with_status(204)
        .create_async()
        .await;

    let value = client()?
        .post_json(RequestOptions::new(format!("{}/action", server.url())).json(json!({})))
        .await?;

    assert_eq!(value, Value::Null);
    Ok(())
}

#[tokio::test]
async fn test_error_envelope_becomes_remote_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/v1.0/groups/1")
        .with_status(404)
        .with_body(
            json!({"error": {"code": "Request_ResourceNotFound", "message": "Resource '1' does not exist."}})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let err = client()?
        .delete(RequestOptions::new(format!("{}/v1.0/groups/1", server.url())))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CommandError>(),
        Some(CommandError::Remote(message)) if message == "Resource '1' does not exist."
    ));
    // Failed requests are not retried
    mock.assert_async().await;
    Ok(())
}
