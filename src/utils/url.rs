//! URL utilities for building the completions endpoint.

use reqwest::Url;

use crate::core::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use quickgpt::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.example.com/v1///"), "https://api.example.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path without doubling slashes.
///
/// ```
/// use quickgpt::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.example.com/v1/", "/chat/completions"),
///     "https://api.example.com/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

/// Parse the chat completions URL for `base_url`, accepting only http(s).
///
/// The base URL is checked on its own before the path is joined, so an empty
/// authority such as `https://` cannot borrow a host from the path.
pub fn chat_completions_url(base_url: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };

    let base = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
    match base.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if base.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Url::parse(&construct_api_url(base.as_str(), CHAT_COMPLETIONS_PATH))
        .map_err(|err| invalid(err.to_string()))
}
