//! The chat client: validate, encode, send, then decode or stream.

use futures_util::StreamExt;
use tracing::debug;

use crate::api::ChatMessage;
use crate::core::error::ClientError;
use crate::core::params::{validate, ChatConfig};
use crate::core::request::encode_request;
use crate::core::stream_parser::{fragments, FragmentStream};
use crate::core::transport::{decode_completion, ChatTransport, TransportReply};

/// The result of a successful [`ChatClient::send`].
pub enum Reply {
    /// The final text of a non-streaming request.
    Complete(String),
    /// Fragments of a streaming request, pulled as they arrive.
    Stream(FragmentStream),
}

impl Reply {
    /// Drain the reply into one string, stopping at the first stream error.
    pub async fn into_text(self) -> Result<String, ClientError> {
        match self {
            Reply::Complete(text) => Ok(text),
            Reply::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(fragment) = stream.next().await {
                    text.push_str(&fragment?);
                }
                Ok(text)
            }
        }
    }
}

pub struct ChatClient<T> {
    transport: T,
}

impl<T: ChatTransport> ChatClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Send one prompt.
    ///
    /// Nothing reaches the transport unless `config` validates and encodes.
    pub async fn send(&self, config: ChatConfig) -> Result<Reply, ClientError> {
        validate(&config)?;
        let request = encode_request(&config, ChatMessage::user(config.prompt.as_str()))?;
        debug!(model = %config.model, stream = config.stream, "request encoded");

        match self.transport.send(request, &config.credential).await? {
            TransportReply::Body(body) => decode_completion(&body).map(Reply::Complete),
            TransportReply::Lines(lines) => Ok(Reply::Stream(fragments(lines))),
        }
    }
}
