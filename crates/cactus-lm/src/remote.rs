//! Remote embedding service.
//!
//! [`RemoteEmbeddingClient`] talks to a Vertex-style `:predict` endpoint:
//! it posts `{"instances":[{"content": text}]}` and reads the vector from
//! `predictions[0].embeddings.values`.

use std::time::Duration;

use async_trait::async_trait;
use cactus_config::RemoteConfig;
use serde_json::json;
use tracing::{debug, warn};

use crate::{BackendError, SessionError};

/// Environment variable consulted when the config carries no token.
pub const TOKEN_ENV_VAR: &str = "CACTUS_TOKEN";

const ERROR_BODY_LIMIT: usize = 200;

#[async_trait]
pub trait RemoteEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;
}

pub struct RemoteEmbeddingClient {
    config: RemoteConfig,
    token: Option<String>,
    http: reqwest::Client,
}

impl RemoteEmbeddingClient {
    pub fn new(config: RemoteConfig) -> Result<Self, SessionError> {
        if !config.is_configured() {
            return Err(SessionError::InvalidConfig(
                "remote embedding endpoint is not set".into(),
            ));
        }

        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()));
        if token.is_none() {
            warn!("no remote embedding token configured; requests will be unauthenticated");
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()
            .map_err(|e| SessionError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            token,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn build_request_body(text: &str) -> serde_json::Value {
        json!({ "instances": [{ "content": text }] })
    }

    pub(crate) fn parse_response(json: serde_json::Value) -> Result<Vec<f32>, BackendError> {
        let values = json["predictions"][0]["embeddings"]["values"]
            .as_array()
            .ok_or_else(|| {
                BackendError::Parse("missing predictions[0].embeddings.values".into())
            })?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| BackendError::Parse(format!("non-numeric embedding value: {v}")))
            })
            .collect()
    }
}

#[async_trait]
impl RemoteEmbedder for RemoteEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "remote embedding request");

        let mut request = self
            .http
            .post(&self.config.endpoint)
            .header("content-type", "application/json")
            .json(&Self::build_request_body(text));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(BackendError::Api(format!("HTTP {status}: {snippet}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        Self::parse_response(json)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    fn configured() -> RemoteConfig {
        RemoteConfig {
            endpoint: "https://embed.example/v1/models/text-embedding-005:predict".into(),
            token: Some("tok".into()),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn request_body_shape() {
        let body = RemoteEmbeddingClient::build_request_body("hello");
        assert_eq!(body["instances"][0]["content"], "hello");
    }

    #[test]
    fn parses_prediction_values() {
        let json = json!({
            "predictions": [{ "embeddings": { "values": [0.25, -1.0, 3] } }]
        });
        assert_eq!(
            RemoteEmbeddingClient::parse_response(json).unwrap(),
            vec![0.25, -1.0, 3.0]
        );
    }

    #[test]
    fn missing_values_is_parse_error() {
        let err = RemoteEmbeddingClient::parse_response(json!({ "predictions": [] })).unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn non_numeric_value_is_parse_error() {
        let json = json!({
            "predictions": [{ "embeddings": { "values": [0.5, "x"] } }]
        });
        assert!(matches!(
            RemoteEmbeddingClient::parse_response(json),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn requires_endpoint() {
        assert!(matches!(
            RemoteEmbeddingClient::new(RemoteConfig::default()),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn uses_configured_token() {
        let client = RemoteEmbeddingClient::new(configured()).unwrap();
        assert!(client.has_token());
        assert!(client.endpoint().ends_with(":predict"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let client = RemoteEmbeddingClient::new(RemoteConfig {
            endpoint: "http://127.0.0.1:9/predict".into(),
            timeout_secs: 1,
            ..configured()
        })
        .unwrap();
        assert!(matches!(
            client.embed("hi").await,
            Err(BackendError::Network(_))
        ));
    }

    /// Answer one HTTP request with `status` and `body`, returning the
    /// endpoint URL and the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/predict", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (url, server)
    }

    fn client_for(endpoint: String) -> RemoteEmbeddingClient {
        RemoteEmbeddingClient::new(RemoteConfig {
            endpoint,
            timeout_secs: 5,
            ..configured()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn embeds_over_http_with_bearer_token() {
        let (url, server) =
            serve_once("200 OK", r#"{"predictions":[{"embeddings":{"values":[1.0,2.0]}}]}"#).await;

        let embedding = client_for(url).embed("hello").await.unwrap();
        assert_eq!(embedding, vec![1.0, 2.0]);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /predict"));
        assert!(request.contains("authorization: bearer tok"));
        assert!(request.contains(r#""instances""#));
        assert!(request.contains(r#""content":"hello""#));
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let (url, server) = serve_once("429 Too Many Requests", "").await;
        assert!(matches!(
            client_for(url).embed("hi").await,
            Err(BackendError::RateLimited)
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let (url, server) = serve_once("500 Internal Server Error", "boom").await;
        match client_for(url).embed("hi").await {
            Err(BackendError::Api(message)) => {
                assert_eq!(message, "HTTP 500 Internal Server Error: boom");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_success_body_is_parse_error() {
        let (url, server) = serve_once("200 OK", "not json").await;
        assert!(matches!(
            client_for(url).embed("hi").await,
            Err(BackendError::Parse(_))
        ));
        server.await.unwrap();
    }

    #[test]
    fn token_falls_back_to_environment() {
        std::env::set_var(TOKEN_ENV_VAR, "from-env");
        let client = RemoteEmbeddingClient::new(RemoteConfig {
            token: None,
            ..configured()
        });
        std::env::remove_var(TOKEN_ENV_VAR);

        assert!(client.unwrap().has_token());
    }
}
