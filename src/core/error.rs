use std::error::Error;
use std::fmt;

use crate::core::params::Parameter;

/// Everything that can stop a chat request, from validation through the
/// last stream frame.
#[derive(Debug)]
pub enum ClientError {
    /// The prompt was empty.
    EmptyInput,
    /// No model was given and none is stored as default.
    MissingModel,
    /// No credential was given and none could be found.
    MissingCredential,
    /// A sampling parameter fell outside its documented range.
    OutOfRange {
        parameter: Parameter,
        min: f64,
        max: f64,
        value: f64,
    },
    /// The configured endpoint could not be turned into an HTTP(S) URL.
    InvalidUrl { url: String, reason: String },
    /// The request body could not be serialized.
    InvalidBody(serde_json::Error),
    /// The response carried no usable completion, or a stream frame failed
    /// to decode.
    NoContent,
    /// A stream line did not carry the `data: ` frame marker.
    InvalidFrame(String),
    /// The server answered with a non-success status.
    Api { status: u16, message: String },
    /// Connection, TLS, timeout or body read failure.
    Transport(reqwest::Error),
}

impl ClientError {
    pub(crate) fn api(status: u16, body: &str) -> Self {
        ClientError::Api {
            status,
            message: summarize_api_error(body),
        }
    }

    /// No distinct exit codes are defined; every failure maps to 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::EmptyInput => write!(f, "No input provided"),
            ClientError::MissingModel => write!(
                f,
                "Could not infer the model to be used. Pass one with --model or set a default with `quickgpt set-model`."
            ),
            ClientError::MissingCredential => write!(
                f,
                "Could not infer the API key. Pass one with --key, set a default with `quickgpt set-api-key`, or export OPENAI_API_KEY."
            ),
            ClientError::OutOfRange {
                parameter,
                min,
                max,
                value,
            } => write!(
                f,
                "{} value should be between and including {min} and {max} (got {value})",
                parameter.name()
            ),
            ClientError::InvalidUrl { url, reason } => {
                write!(f, "Invalid API endpoint '{url}': {reason}")
            }
            ClientError::InvalidBody(err) => {
                write!(f, "Could not construct the API request: {err}")
            }
            ClientError::NoContent => write!(f, "No response from the API"),
            ClientError::InvalidFrame(line) => {
                write!(f, "Malformed stream frame: {line:?}")
            }
            ClientError::Api { status, message } => {
                if message.is_empty() {
                    write!(f, "API error (HTTP {status})")
                } else {
                    write!(f, "API error (HTTP {status}): {message}")
                }
            }
            ClientError::Transport(err) => write!(f, "Request failed: {err}"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::InvalidBody(err) => Some(err),
            ClientError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Pull a one-line summary out of an error body, preferring `error.message`
/// when the body is JSON.
fn summarize_api_error(body: &str) -> String {
    let trimmed = body.trim();
    let summary = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .or_else(|| {
                    value
                        .get("error")
                        .and_then(|v| v.as_str())
                        .map(str::to_owned)
                })
                .or_else(|| {
                    value
                        .get("message")
                        .and_then(|v| v.as_str())
                        .map(str::to_owned)
                })
        })
        .unwrap_or_else(|| trimmed.to_string());

    summary.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_nested_message() {
        let err = ClientError::api(
            401,
            r#"{"error":{"message":"Incorrect API key   provided","type":"invalid_request_error"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "API error (HTTP 401): Incorrect API key provided"
        );
    }

    #[test]
    fn api_error_falls_back_to_flat_fields_and_plain_text() {
        let flat = ClientError::api(500, r#"{"error":"overloaded"}"#);
        assert_eq!(flat.to_string(), "API error (HTTP 500): overloaded");

        let plain = ClientError::api(502, "  bad gateway\n");
        assert_eq!(plain.to_string(), "API error (HTTP 502): bad gateway");

        let empty = ClientError::api(503, "");
        assert_eq!(empty.to_string(), "API error (HTTP 503)");
    }

    #[test]
    fn out_of_range_names_the_parameter() {
        let err = ClientError::OutOfRange {
            parameter: Parameter::MaxCompletionTokens,
            min: 1.0,
            max: 16383.0,
            value: 0.0,
        };
        assert_eq!(
            err.to_string(),
            "maxCompletionTokens value should be between and including 1 and 16383 (got 0)"
        );
        assert_eq!(err.exit_code(), 1);
    }
}
