use std::pin::Pin;
use std::time::Duration;

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use serde_json::json;
use thiserror::Error;

use super::decoder::NdjsonDecoder;
use crate::core::AppConfig;

/// Errors establishing or reading one upstream generate stream. A malformed
/// NDJSON line is not represented here: the decoder recovers from it locally
/// by dropping the line.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    #[error("upstream returned {0} without a token stream")]
    BodyMissing(reqwest::StatusCode),
    #[error("upstream stream interrupted: {0}")]
    Interrupted(String),
}

/// A lazy, single-pass sequence of generated tokens. Dropping the stream
/// aborts the in-flight upstream request, releasing the connection.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GenerateError>> + Send>>;

/// Client for an Ollama compatible `/api/generate` endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Issue a streaming generate request for a single prompt. Each request
    /// is stateless from the model's perspective; no history is sent.
    pub async fn generate(&self, prompt: &str) -> Result<TokenStream, GenerateError> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": true,
        });
        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60 * 10))
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::BodyMissing(status));
        }

        let mut bytes = response.bytes_stream();
        let stream = stream! {
            let mut decoder = NdjsonDecoder::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for token in decoder.feed(&chunk) {
                            yield Ok(token);
                        }
                    }
                    Err(err) => {
                        yield Err(GenerateError::Interrupted(err.to_string()));
                        return;
                    }
                }
            }
            decoder.finish();
            if decoder.malformed_lines() > 0 {
                tracing::warn!(
                    "Upstream stream contained {} malformed lines",
                    decoder.malformed_lines()
                );
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: &str) -> OllamaClient {
        OllamaClient::new(&AppConfig {
            ollama_url: url.to_string(),
            ollama_model: "test-model".to_string(),
        })
    }

    async fn collect(mut stream: TokenStream) -> Result<Vec<String>, GenerateError> {
        let mut tokens = Vec::new();
        while let Some(item) = stream.next().await {
            tokens.push(item?);
        }
        Ok(tokens)
    }

    #[tokio::test]
    async fn test_generate_streams_tokens() {
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

        let client = client_for(&server.url());
        let stream = client.generate("hi").await.expect("Request failed");
        let tokens = collect(stream).await.expect("Stream failed");

        assert_eq!(tokens, vec!["Hello", " world"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_skips_malformed_lines() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body("garbage\n{\"response\":\"ok\"}\n")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let stream = client.generate("hi").await.expect("Request failed");
        let tokens = collect(stream).await.expect("Stream failed");

        assert_eq!(tokens, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_generate_error_status_is_body_missing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result = client.generate("hi").await;

        assert!(matches!(result, Err(GenerateError::BodyMissing(status)) if status == 500));
    }

    #[tokio::test]
    async fn test_generate_connect_failure_is_unreachable() {
        // Port 1 is never bound locally so the connection is refused
        let client = client_for("http://127.0.0.1:1");
        let result = client.generate("hi").await;

        assert!(matches!(result, Err(GenerateError::Unreachable(_))));
    }
}
