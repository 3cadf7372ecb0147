//! Splits a chunked response body into event-stream lines.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use memchr::memchr;

use crate::core::error::ClientError;

/// A lazily-read sequence of response lines.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Reassembles lines that arrive split across network chunks.
///
/// Blank event separators and `:` comment lines (keep-alives) are dropped,
/// and a trailing `\r` is removed from every line.
#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(relative) = memchr(b'\n', &self.buffer[start..]) {
            let newline = start + relative;
            if let Some(line) = Self::decode_line(&self.buffer[start..newline]) {
                lines.push(line);
            }
            start = newline + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        lines
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        Self::decode_line(&rest)
    }

    fn decode_line(bytes: &[u8]) -> Option<String> {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        if bytes.is_empty() || bytes[0] == b':' {
            return None;
        }
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}

struct ByteLines<S> {
    bytes: S,
    buffer: SseLineBuffer,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a stream of body chunks into a [`LineStream`] without buffering the
/// whole body. Chunks are only pulled when the caller asks for the next line.
pub fn lines_from_bytes<S, B>(bytes: S) -> LineStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = ByteLines {
        bytes,
        buffer: SseLineBuffer::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                return Some((Ok(line), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.buffer.push(chunk.as_ref());
                    state.pending.extend(lines);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(ClientError::Transport(err)), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.buffer.finish());
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_handles_partial_lines() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: {\"choices\"").is_empty());
        assert_eq!(
            buffer.push(b":[]}\n\ndata: two\r\n"),
            vec!["data: {\"choices\":[]}", "data: two"]
        );
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn buffer_drops_comments_and_flushes_tail() {
        let mut buffer = SseLineBuffer::default();
        assert_eq!(
            buffer.push(b": keep-alive\n\ndata: one\ndata: tw"),
            vec!["data: one"]
        );
        assert_eq!(buffer.finish().as_deref(), Some("data: tw"));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn buffer_keeps_multibyte_characters_split_across_chunks() {
        let text = "data: héllo\n".as_bytes();
        let split = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(&text[..split]).is_empty());
        assert_eq!(buffer.push(&text[split..]), vec!["data: héllo"]);
    }

    #[tokio::test]
    async fn line_stream_reads_chunks_lazily() {
        let chunks: Vec<Result<&'static [u8], reqwest::Error>> = vec![
            Ok(&b"data: a\n\nda"[..]),
            Ok(&b"ta: b\n\n"[..]),
            Ok(&b"data: c"[..]),
        ];
        let lines: Vec<String> = lines_from_bytes(stream::iter(chunks))
            .map(|line| line.expect("no transport errors"))
            .collect()
            .await;
        assert_eq!(lines, vec!["data: a", "data: b", "data: c"]);
    }
}
