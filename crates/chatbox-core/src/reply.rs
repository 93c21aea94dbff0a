use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, Result};

/// Endpoint used when neither config nor environment names one
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/chat";

/// Maps one user message to one bot reply
#[async_trait]
pub trait ReplyService: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ReplyResponse {
    reply: String,
}

#[derive(Clone)]
pub struct HttpReplyClient {
    client: Client,
    endpoint: String,
}

impl HttpReplyClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyService for HttpReplyClient {
    async fn reply(&self, message: &str) -> Result<String> {
        debug!(endpoint = %self.endpoint, "requesting reply");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ReplyRequest { message })
            .send()
            .await?;

        // The body decides the outcome; the status code is only logged
        debug!(status = %response.status(), "reply service answered");
        let body = response.text().await?;
        let parsed: ReplyResponse =
            serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(parsed.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one request with `status` and `body`, returning the raw request.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}/chat", addr), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn test_reply_posts_message_and_decodes_reply() {
        let (endpoint, server) = serve_once("200 OK", r#"{"reply":"Hi there"}"#).await;
        let client = HttpReplyClient::new(&endpoint);

        let reply = client.reply("Hello").await.unwrap();
        assert_eq!(reply, "Hi there");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat "));
        assert!(request.ends_with(r#"{"message":"Hello"}"#));
    }

    #[tokio::test]
    async fn test_missing_reply_field_is_decode_error() {
        let (endpoint, _server) = serve_once("200 OK", r#"{"answer":"nope"}"#).await;
        let client = HttpReplyClient::new(&endpoint);

        let err = client.reply("Hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[tokio::test]
    async fn test_error_status_with_reply_body_is_a_reply() {
        let (endpoint, _server) =
            serve_once("500 Internal Server Error", r#"{"reply":"Sorry, the model is overloaded"}"#)
                .await;
        let client = HttpReplyClient::new(&endpoint);

        let reply = client.reply("Hello").await.unwrap();
        assert_eq!(reply, "Sorry, the model is overloaded");
    }

    #[tokio::test]
    async fn test_error_status_without_reply_body_is_decode_error() {
        let (endpoint, _server) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;
        let client = HttpReplyClient::new(&endpoint);

        let err = client.reply("Hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpReplyClient::new(&format!("http://{}/chat", addr));
        let err = client.reply("Hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}
