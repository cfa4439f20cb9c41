//! Integration tests for the generate relay endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::test_utils::test_app;

    fn generate_request(prompt: &str) -> Request<Body> {
        Request::builder()
            .uri("/api/generate")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "prompt": prompt }).to_string(),
            ))
            .unwrap()
    }

    /// Tests that upstream NDJSON tokens are relayed as concatenated text
    #[tokio::test]
    async fn it_relays_upstream_tokens_as_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/x-ndjson")
            .with_body(concat!(
                "{\"response\":\"Hello\"}\n",
                "{\"response\":\" world\"}\n",
                "{\"response\":\"\",\"done\":true}\n",
            ))
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app.oneshot(generate_request("hi")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .expect("Missing content type"),
            "text/event-stream"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Hello world");
        mock.assert_async().await;
    }

    /// Tests that malformed upstream lines never reach the client
    #[tokio::test]
    async fn it_drops_malformed_upstream_lines() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body("not-json\n{\"response\":\"ok\"}\n")
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app.oneshot(generate_request("hi")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    /// Tests that a trailing fragment with no newline is never relayed
    #[tokio::test]
    async fn it_discards_trailing_fragment() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body("{\"response\":\"done\"}\n{\"response\":\"partial")
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app.oneshot(generate_request("hi")).await.unwrap();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"done");
    }

    /// Tests that an upstream error status maps to a 502 response
    #[tokio::test]
    async fn it_returns_bad_gateway_on_upstream_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app.oneshot(generate_request("hi")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    /// Tests that an unreachable upstream maps to a 502 response
    #[tokio::test]
    async fn it_returns_bad_gateway_when_upstream_unreachable() {
        let app = test_app("http://127.0.0.1:1");
        let response = app.oneshot(generate_request("hi")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    /// Tests that a request without a prompt is rejected
    #[tokio::test]
    async fn it_rejects_request_without_prompt() {
        let app = test_app("http://127.0.0.1:1");
        let request = Request::builder()
            .uri("/api/generate")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
