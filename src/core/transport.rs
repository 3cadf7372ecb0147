use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use tracing::debug;

use crate::api::ChatResponse;
use crate::core::error::ClientError;
use crate::core::request::EncodedRequest;
use crate::core::sse::{lines_from_bytes, LineStream};
use crate::utils::url::chat_completions_url;

/// What came back from the server.
pub enum TransportReply {
    /// The complete body of a non-streaming response.
    Body(Vec<u8>),
    /// A live line stream; the connection stays open until it is dropped.
    Lines(LineStream),
}

/// Sends one encoded request and hands back the response.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        request: EncodedRequest,
        credential: &str,
    ) -> Result<TransportReply, ClientError>;
}

/// [`ChatTransport`] over HTTPS with reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Build a transport for `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// A malformed URL fails here, before any connection is attempted.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let endpoint = chat_completions_url(base_url)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::Transport)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(
        &self,
        request: EncodedRequest,
        credential: &str,
    ) -> Result<TransportReply, ClientError> {
        let streaming = request.is_streaming();
        debug!(url = %self.endpoint, streaming, "sending chat completion request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {credential}"))
            .body(request.into_body())
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        debug!(%status, "chat completion response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::api(status.as_u16(), &body));
        }

        if streaming {
            Ok(TransportReply::Lines(lines_from_bytes(Box::pin(
                response.bytes_stream(),
            ))))
        } else {
            let body = response.bytes().await.map_err(ClientError::Transport)?;
            Ok(TransportReply::Body(body.to_vec()))
        }
    }
}

/// Decode a complete response body and return the first choice's text.
pub fn decode_completion(body: &[u8]) -> Result<String, ClientError> {
    let response: ChatResponse = serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "undecodable chat completion body");
        ClientError::NoContent
    })?;

    debug!(model = %response.model, choices = response.choices.len(), "decoded completion");
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(ClientError::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatMessage;
    use crate::core::params::ChatConfig;
    use crate::core::request::encode_request;
    use futures_util::StreamExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response and report the raw request it received.
    async fn serve_once(status_line: &'static str, content_type: &'static str, body: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());

            let response = format!(
                "{status_line}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write");
            let _ = socket.shutdown().await;
        });

        (format!("http://{addr}/v1"), rx)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + length
    }

    fn encoded(stream: bool) -> EncodedRequest {
        let mut config = ChatConfig::new("Hello", "gpt-4o", "sk-test");
        config.stream = stream;
        encode_request(&config, ChatMessage::user("Hello")).unwrap()
    }

    #[test]
    fn decode_completion_returns_first_choice() {
        let body = br#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}},{"index":1,"message":{"role":"assistant","content":"Hello!"}}],"model":"gpt-4o"}"#;
        assert_eq!(decode_completion(body).unwrap(), "Hi!");
    }

    #[test]
    fn decode_completion_without_choices_is_no_content() {
        let cases: [&[u8]; 4] = [
            br#"{"choices":[],"model":"gpt-4o"}"#,
            br#"{"choices":[{"index":0,"message":{"role":"assistant","content":null}}],"model":"gpt-4o"}"#,
            b"not json",
            br#"{"model":"gpt-4o"}"#,
        ];
        for body in cases {
            assert!(matches!(
                decode_completion(body),
                Err(ClientError::NoContent)
            ));
        }
    }

    #[test]
    fn malformed_base_url_is_rejected_up_front() {
        assert!(matches!(
            HttpTransport::new("not a url", None),
            Err(ClientError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpTransport::new("ftp://example.com", None),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn endpoint_appends_chat_completions() {
        let transport =
            HttpTransport::new("https://api.openai.com/v1/", Some(Duration::from_secs(5))).unwrap();
        assert_eq!(
            transport.endpoint().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn posts_json_with_bearer_auth() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}}],"model":"gpt-4o"}"#;
        let (base_url, request_rx) =
            serve_once("HTTP/1.1 200 OK", "application/json", body.to_string()).await;

        let transport = HttpTransport::new(&base_url, None).unwrap();
        let reply = transport.send(encoded(false), "sk-test").await.unwrap();
        let TransportReply::Body(bytes) = reply else {
            panic!("expected a complete body");
        };
        assert_eq!(decode_completion(&bytes).unwrap(), "Hi!");

        let raw = request_rx.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /v1/chat/completions HTTP/1.1"));
        assert!(lower.contains("content-type: application/json"));
        assert!(raw.contains("Bearer sk-test"));
        assert!(raw.contains(r#""response_format":{"type":"text"}"#));
    }

    #[tokio::test]
    async fn streaming_reply_yields_lines() {
        let body = [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
            "",
            "data: [DONE]",
            "",
        ]
        .join("\n");
        let (base_url, _request_rx) =
            serve_once("HTTP/1.1 200 OK", "text/event-stream", body).await;

        let transport = HttpTransport::new(&base_url, None).unwrap();
        let TransportReply::Lines(lines) = transport.send(encoded(true), "sk-test").await.unwrap()
        else {
            panic!("expected a line stream");
        };
        let lines: Vec<String> = lines.map(Result::unwrap).collect().await;
        assert_eq!(
            lines,
            vec![
                r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
                r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
                "data: [DONE]",
            ]
        );
    }

    #[tokio::test]
    async fn error_status_carries_server_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        let (base_url, _request_rx) =
            serve_once("HTTP/1.1 401 Unauthorized", "application/json", body.to_string()).await;

        let transport = HttpTransport::new(&base_url, None).unwrap();
        match transport.send(encoded(false), "bad").await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            Err(other) => panic!("expected Api error, got {other:?}"),
            Ok(_) => panic!("expected Api error, got a reply"),
        }
    }
}
