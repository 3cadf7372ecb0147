use crate::api::{ChatMessage, ChatRequest, ResponseFormat};
use crate::core::error::ClientError;
use crate::core::params::ChatConfig;

/// A serialized request body, ready to be sent once.
#[derive(Debug)]
pub struct EncodedRequest {
    body: Vec<u8>,
    stream: bool,
}

impl EncodedRequest {
    pub fn is_streaming(&self) -> bool {
        self.stream
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Serialize `config` and `message` into the chat completions body.
///
/// `config` is expected to have passed [`crate::core::params::validate`].
pub fn encode_request(
    config: &ChatConfig,
    message: ChatMessage,
) -> Result<EncodedRequest, ClientError> {
    let request = ChatRequest {
        model: &config.model,
        messages: vec![message],
        temperature: config.temperature,
        max_completion_tokens: config.max_completion_tokens,
        top_p: config.top_p,
        frequency_penalty: config.frequency_penalty,
        presence_penalty: config.presence_penalty,
        stream: config.stream,
        response_format: ResponseFormat::TEXT,
    };

    let body = serde_json::to_vec(&request).map_err(ClientError::InvalidBody)?;
    Ok(EncodedRequest {
        body,
        stream: config.stream,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn decode(request: &EncodedRequest) -> Value {
        serde_json::from_slice(request.body()).expect("body should be JSON")
    }

    #[test]
    fn wire_keys_are_snake_case() {
        let config = ChatConfig::new("Hello", "gpt-4o", "sk-test");
        let request = encode_request(&config, ChatMessage::user("Hello")).unwrap();
        let body = decode(&request);

        let mut keys: Vec<&str> = body
            .as_object()
            .expect("body should be an object")
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            [
                "frequency_penalty",
                "max_completion_tokens",
                "messages",
                "model",
                "presence_penalty",
                "response_format",
                "stream",
                "temperature",
                "top_p",
            ]
        );
    }

    #[test]
    fn body_carries_config_values() {
        let mut config = ChatConfig::new("Tell me a joke", "gpt-4o-mini", "sk-test");
        config.temperature = 0.2;
        config.max_completion_tokens = 16383;
        config.top_p = 0.5;
        config.frequency_penalty = 2.0;
        config.presence_penalty = 1.5;
        config.stream = false;

        let request = encode_request(&config, ChatMessage::user("Tell me a joke")).unwrap();
        assert!(!request.is_streaming());
        assert_eq!(
            decode(&request),
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Tell me a joke"}],
                "temperature": 0.2,
                "max_completion_tokens": 16383,
                "top_p": 0.5,
                "frequency_penalty": 2.0,
                "presence_penalty": 1.5,
                "stream": false,
                "response_format": {"type": "text"},
            })
        );
    }

    #[test]
    fn response_format_is_fixed_text() {
        for stream in [true, false] {
            let mut config = ChatConfig::new("x", "m", "k");
            config.stream = stream;
            let request = encode_request(&config, ChatMessage::user("x")).unwrap();
            assert_eq!(request.is_streaming(), stream);
            assert_eq!(decode(&request)["response_format"], json!({"type": "text"}));
        }
    }

    #[test]
    fn credential_never_reaches_the_body() {
        let config = ChatConfig::new("Hello", "gpt-4o", "sk-very-secret");
        let request = encode_request(&config, ChatMessage::user("Hello")).unwrap();
        let text = String::from_utf8(request.into_body()).unwrap();
        assert!(!text.contains("sk-very-secret"));
    }
}
