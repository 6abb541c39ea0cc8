//! Server-sent-events (SSE) decoding.
//!
//! Both the provider client and the relay's own client consume `data:`-framed
//! event streams whose payloads arrive split across arbitrary network chunks.
//! [`SseDecoder`] reassembles complete events from those chunks;
//! [`decode_stream`] lifts a raw byte stream into a [`DeltaStream`] by feeding
//! each payload through a caller-supplied parser.

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};

use super::{DeltaStream, ProviderError};

/// Outcome of parsing a single SSE `data:` payload.
pub enum Parsed {
    /// A text fragment to forward downstream.
    Delta(String),
    /// A well-formed event carrying nothing of interest (e.g. an empty delta).
    Skip,
    /// The end-of-stream sentinel; the stream finishes here.
    Done,
    /// The payload signalled a failure; the stream yields it and finishes.
    Fail(ProviderError),
}

/// Incremental SSE parser.
///
/// Feed it raw bytes as they arrive; it returns the `data:` payloads of every
/// event completed so far, buffering any trailing partial event.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` to the internal buffer and drains all completed events.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some((end, skip)) = find_event_boundary(&self.buf) {
            let event: Vec<u8> = self.buf.drain(..end + skip).take(end).collect();
            if let Some(payload) = parse_event(&event) {
                payloads.push(payload);
            }
        }
        payloads
    }
}

// Locate the earliest blank-line event terminator. Returns the byte offset of
// the terminator and its length.
fn find_event_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

// Extract the joined `data:` payload of one event block, ignoring comments and
// other fields. Returns `None` for events without a data field.
fn parse_event(event: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(event);
    let mut data_lines = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

/// Turns a raw byte stream of SSE frames into a [`DeltaStream`].
///
/// `parse` is called once per complete `data:` payload and decides whether the
/// payload is a delta, the done sentinel, or an error. The returned stream ends
/// after [`Parsed::Done`], after yielding a [`Parsed::Fail`] error, or when the
/// byte stream itself ends or fails.
pub fn decode_stream<S, E, P>(bytes: S, parse: P) -> DeltaStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display,
    P: Fn(&str) -> Parsed + Send + 'static,
{
    struct State<S, P> {
        bytes: std::pin::Pin<Box<S>>,
        parse: P,
        decoder: SseDecoder,
        pending: std::collections::VecDeque<Result<String, ProviderError>>,
        finished: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        parse,
        decoder: SseDecoder::new(),
        pending: std::collections::VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    for payload in st.decoder.push(&chunk) {
                        match (st.parse)(&payload) {
                            Parsed::Delta(text) => st.pending.push_back(Ok(text)),
                            Parsed::Skip => {}
                            Parsed::Done => {
                                st.finished = true;
                                break;
                            }
                            Parsed::Fail(e) => {
                                st.pending.push_back(Err(e));
                                st.finished = true;
                                break;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    st.pending
                        .push_back(Err(ProviderError::Stream(e.to_string())));
                    st.finished = true;
                }
                None => st.finished = true,
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_event() {
        let mut dec = SseDecoder::new();
        assert_eq!(dec.push(b"data: hello\n\n"), vec!["hello"]);
    }

    #[test]
    fn event_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: hel").is_empty());
        assert!(dec.push(b"lo wor").is_empty());
        assert_eq!(dec.push(b"ld\n\n"), vec!["hello world"]);
    }

    #[test]
    fn multiple_events_in_one_chunk() {
        let mut dec = SseDecoder::new();
        assert_eq!(dec.push(b"data: a\n\ndata: b\n\ndata: c\n\n"), vec![
            "a", "b", "c"
        ]);
    }

    #[test]
    fn crlf_framing() {
        let mut dec = SseDecoder::new();
        assert_eq!(dec.push(b"data: first\r\n\r\ndata: second\r\n\r\n"), vec![
            "first", "second"
        ]);
    }

    #[test]
    fn comments_and_other_fields_ignored() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b": keep-alive\n\n").is_empty());
        assert_eq!(dec.push(b"event: message\nid: 7\ndata: x\n\n"), vec!["x"]);
    }

    #[test]
    fn multiline_data_joined() {
        let mut dec = SseDecoder::new();
        assert_eq!(dec.push(b"data: line1\ndata: line2\n\n"), vec![
            "line1\nline2"
        ]);
    }

    #[tokio::test]
    async fn decode_stream_forwards_deltas_until_done() {
        let chunks: Vec<Result<Bytes, std::convert::Infallible>> = vec![
            Ok(Bytes::from_static(b"data: a\n\ndata: b\n\n")),
            Ok(Bytes::from_static(b"data: [DONE]\n\ndata: ignored\n\n")),
        ];
        let deltas = decode_stream(stream::iter(chunks), |payload| {
            if payload == "[DONE]" {
                Parsed::Done
            } else {
                Parsed::Delta(payload.to_owned())
            }
        });
        let collected: Vec<_> = deltas.collect().await;
        let texts: Vec<_> = collected.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn decode_stream_surfaces_byte_errors() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: a\n\n")),
            Err(std::io::Error::other("boom")),
        ];
        let deltas = decode_stream(stream::iter(chunks), |payload| {
            Parsed::Delta(payload.to_owned())
        });
        let collected: Vec<_> = deltas.collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].as_ref().unwrap(), "a");
        assert!(collected[1].is_err());
    }
}
