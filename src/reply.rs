use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a reply could not be produced. The widget never shows these to the
/// user; they exist for the diagnostic log only.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("backend returned an undecodable body: {0}")]
    Body(String),
}

/// Source of bot replies. Injected into the widget at construction so the
/// widget itself carries no knowledge of where replies come from.
#[async_trait]
pub trait ReplyService: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, ReplyError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Client for the remote reply backend: `POST {base_url}/api/chat` with
/// `{"message": ...}`, expecting `{"reply": ...}` back. No authentication,
/// no session identifier, no retries.
#[derive(Clone)]
pub struct HttpReplyClient {
    client: Client,
    base_url: String,
}

impl HttpReplyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ReplyService for HttpReplyClient {
    async fn reply(&self, message: &str) -> Result<String, ReplyError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReplyError::Status(response.status()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReplyError::Body(e.to_string()))?;
        Ok(body.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_message_and_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"message": "Hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "Hi there"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpReplyClient::new(&server.uri());
        let reply = client.reply("Hello").await.unwrap();
        assert_eq!(reply, "Hi there");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpReplyClient::new(&server.uri());
        match client.reply("Hello").await {
            Err(ReplyError::Status(code)) => assert_eq!(code.as_u16(), 500),
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HttpReplyClient::new(&server.uri());
        assert!(matches!(
            client.reply("Hello").await,
            Err(ReplyError::Body(_))
        ));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "ok"
            })))
            .mount(&server)
            .await;

        let client = HttpReplyClient::new(&format!("{}/", server.uri()));
        assert_eq!(client.reply("hi").await.unwrap(), "ok");
    }
}
