//! Decodes streamed chat completion frames into text fragments.
//!
//! Each line is either empty (end of stream) or a `data: ` marker followed by
//! a JSON chunk. The parser is a two-state machine, `Reading` then `Done`;
//! once it is done, or once a frame fails, no more lines are read.

use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::debug;

use crate::api::StreamChatResponse;
use crate::core::error::ClientError;

/// The event-frame marker. Six bytes, matched exactly.
pub const FRAME_PREFIX: &str = "data: ";

/// Payload the OpenAI API sends as its final frame.
pub const DONE_PAYLOAD: &str = "[DONE]";

/// Fragments of assistant text, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Reading,
    Done,
}

/// What one line contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A piece of assistant text, possibly empty.
    Fragment(String),
    /// A well-formed frame with no text, such as the opening role announcement.
    Skip,
    /// The end-of-stream sentinel.
    Done,
}

#[derive(Debug)]
pub struct StreamFrameParser {
    state: ParserState,
}

impl Default for StreamFrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamFrameParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Reading,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Feed one line. Any error also moves the parser to `Done`.
    pub fn parse_line(&mut self, line: &str) -> Result<FrameOutcome, ClientError> {
        if self.state == ParserState::Done {
            return Ok(FrameOutcome::Done);
        }

        let outcome = Self::decode(line);
        if matches!(outcome, Ok(FrameOutcome::Done) | Err(_)) {
            self.state = ParserState::Done;
        }
        outcome
    }

    fn decode(line: &str) -> Result<FrameOutcome, ClientError> {
        if line.is_empty() {
            debug!("stream end marker");
            return Ok(FrameOutcome::Done);
        }

        let Some(payload) = line.strip_prefix(FRAME_PREFIX) else {
            debug!(line, "frame without data marker");
            return Err(ClientError::InvalidFrame(line.to_string()));
        };

        if payload == DONE_PAYLOAD {
            debug!("stream done payload");
            return Ok(FrameOutcome::Done);
        }

        let frame: StreamChatResponse = serde_json::from_str(payload).map_err(|err| {
            debug!(error = %err, payload, "undecodable stream frame");
            ClientError::NoContent
        })?;

        let content = frame
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content);

        Ok(content.map_or(FrameOutcome::Skip, FrameOutcome::Fragment))
    }
}

/// Wrap a line source in a lazy fragment stream.
///
/// The stream ends at the end-of-stream marker or when `lines` runs out,
/// whichever comes first. An error is yielded once and then the stream ends.
/// Dropping the stream drops `lines`, which releases the connection behind it.
pub fn fragments<S>(lines: S) -> FragmentStream
where
    S: Stream<Item = Result<String, ClientError>> + Send + 'static,
{
    let lines = Box::pin(lines);
    let parser = StreamFrameParser::new();

    Box::pin(stream::unfold(
        (lines, parser),
        |(mut lines, mut parser)| async move {
            loop {
                if parser.state() == ParserState::Done {
                    return None;
                }

                let line = match lines.next().await {
                    Some(Ok(line)) => line,
                    Some(Err(err)) => {
                        parser.state = ParserState::Done;
                        return Some((Err(err), (lines, parser)));
                    }
                    None => return None,
                };

                match parser.parse_line(&line) {
                    Ok(FrameOutcome::Fragment(text)) => return Some((Ok(text), (lines, parser))),
                    Ok(FrameOutcome::Skip) => continue,
                    Ok(FrameOutcome::Done) => return None,
                    Err(err) => return Some((Err(err), (lines, parser))),
                }
            }
        },
    ))
}
