//! Request inputs and their range checks.
//!
//! [`validate`] runs before anything touches the network, so a rejected
//! [`ChatConfig`] never produces a request.

use std::fmt;

use crate::core::error::ClientError;

pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 2048;
pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_FREQUENCY_PENALTY: f64 = 0.0;
pub const DEFAULT_PRESENCE_PENALTY: f64 = 0.0;

/// The sampling parameters that carry a documented range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Temperature,
    MaxCompletionTokens,
    TopP,
    FrequencyPenalty,
    PresencePenalty,
}

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::MaxCompletionTokens => "maxCompletionTokens",
            Parameter::TopP => "topP",
            Parameter::FrequencyPenalty => "frequencyPenalty",
            Parameter::PresencePenalty => "presencePenalty",
        }
    }

    /// Inclusive `(min, max)` bounds.
    pub fn range(self) -> (f64, f64) {
        match self {
            Parameter::Temperature | Parameter::TopP => (0.0, 1.0),
            Parameter::MaxCompletionTokens => (1.0, 16383.0),
            Parameter::FrequencyPenalty | Parameter::PresencePenalty => (0.0, 2.0),
        }
    }

    fn check(self, value: f64) -> Result<(), ClientError> {
        let (min, max) = self.range();
        // NaN fails both comparisons and is rejected here.
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(ClientError::OutOfRange {
                parameter: self,
                min,
                max,
                value,
            })
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything one invocation needs to build a request.
#[derive(Clone)]
pub struct ChatConfig {
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_completion_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub stream: bool,
    pub credential: String,
}

impl ChatConfig {
    /// A config with the CLI's default sampling parameters and streaming on.
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
            stream: true,
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("prompt", &self.prompt)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_completion_tokens", &self.max_completion_tokens)
            .field("top_p", &self.top_p)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("presence_penalty", &self.presence_penalty)
            .field("stream", &self.stream)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Check a config, reporting the first problem found.
///
/// Order: prompt, model, credential, then temperature, max completion
/// tokens, top-p, frequency penalty and presence penalty.
pub fn validate(config: &ChatConfig) -> Result<(), ClientError> {
    if config.prompt.is_empty() {
        return Err(ClientError::EmptyInput);
    }
    if config.model.trim().is_empty() {
        return Err(ClientError::MissingModel);
    }
    if config.credential.trim().is_empty() {
        return Err(ClientError::MissingCredential);
    }

    Parameter::Temperature.check(config.temperature)?;
    Parameter::MaxCompletionTokens.check(f64::from(config.max_completion_tokens))?;
    Parameter::TopP.check(config.top_p)?;
    Parameter::FrequencyPenalty.check(config.frequency_penalty)?;
    Parameter::PresencePenalty.check(config.presence_penalty)?;
    Ok(())
}
