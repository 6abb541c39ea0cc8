//! HTTP/1.1 response builder.
//!
//! Provides a fluent builder API for constructing HTTP responses. Responses
//! carry either a buffered body (written with `Content-Length`) or a lazy byte
//! stream (written with chunked transfer encoding, flushed per chunk so the
//! peer observes incremental delivery).

use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::{BufMut, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use super::{Headers, StatusCode};

/// A boxed, lazy stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

enum Body {
    Buffered(Vec<u8>),
    Streamed(ByteStream),
}

/// An HTTP/1.1 response, ready to be written to a connection.
///
/// # Examples
///
/// ```
/// use codedraft::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
/// assert_eq!(response.status(), StatusCode::Ok);
/// ```
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Body,
    keep_alive: bool,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Body::Buffered(Vec::new()),
            keep_alive: true,
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a buffered response body from a string.
    ///
    /// The `Content-Length` header is written automatically.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Buffered(body.into().into_bytes());
        self
    }

    /// Sets a streamed response body.
    ///
    /// The body is written with chunked transfer encoding; each chunk is
    /// flushed as soon as the stream yields it. A stream error terminates the
    /// body early but still closes the chunked framing cleanly.
    #[must_use]
    pub fn stream(mut self, body: ByteStream) -> Self {
        self.body = Body::Streamed(body);
        self
    }

    /// Controls whether the `Connection: keep-alive` or `Connection: close` header is written.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns `true` unless this response asked for the connection to close.
    pub fn is_keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Writes the response to `writer` in HTTP/1.1 wire format.
    ///
    /// Automatically adds:
    /// - `Content-Type: text/plain; charset=utf-8` for non-empty buffered
    ///   bodies without an explicit `Content-Type`.
    /// - `Content-Length` (buffered) or `Transfer-Encoding: chunked` (streamed).
    /// - `Connection: keep-alive` or `Connection: close`.
    pub async fn write_into<W>(self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let Self {
            status,
            mut headers,
            body,
            keep_alive,
        } = self;

        let connection = if keep_alive { "keep-alive" } else { "close" };
        headers.insert("Connection", connection);

        match body {
            Body::Buffered(bytes) => {
                if !bytes.is_empty() && !headers.contains("content-type") {
                    headers.insert("Content-Type", "text/plain; charset=utf-8");
                }

                let mut buf = BytesMut::with_capacity(128 + headers.len() * 64 + bytes.len());
                write_head(&mut buf, status, &headers);
                buf.put(format!("Content-Length: {}\r\n\r\n", bytes.len()).as_bytes());
                buf.put(bytes.as_slice());

                writer.write_all(&buf).await?;
                writer.flush().await
            }
            Body::Streamed(mut stream) => {
                let mut buf = BytesMut::with_capacity(128 + headers.len() * 64);
                write_head(&mut buf, status, &headers);
                buf.put(&b"Transfer-Encoding: chunked\r\n\r\n"[..]);
                writer.write_all(&buf).await?;
                writer.flush().await?;

                while let Some(item) = stream.next().await {
                    match item {
                        // A zero-length chunk would terminate the body early.
                        Ok(chunk) if chunk.is_empty() => continue,
                        Ok(chunk) => {
                            writer
                                .write_all(format!("{:X}\r\n", chunk.len()).as_bytes())
                                .await?;
                            writer.write_all(&chunk).await?;
                            writer.write_all(b"\r\n").await?;
                            writer.flush().await?;
                        }
                        Err(e) => {
                            warn!(error = %e, "response body stream failed — terminating early");
                            break;
                        }
                    }
                }

                writer.write_all(b"0\r\n\r\n").await?;
                writer.flush().await
            }
        }
    }
}

fn write_head(buf: &mut BytesMut, status: StatusCode, headers: &Headers) {
    buf.put(format!("HTTP/1.1 {} {}\r\n", status.as_u16(), status.canonical_reason()).as_bytes());
    for (name, value) in headers.iter() {
        buf.put(format!("{name}: {value}\r\n").as_bytes());
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            Body::Buffered(b) => format!("Buffered({} bytes)", b.len()),
            Body::Streamed(_) => "Streamed".to_owned(),
        };
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &body)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio::io::AsyncReadExt;

    async fn render(response: Response) -> String {
        let (mut tx, mut rx) = tokio::io::duplex(64 * 1024);
        response.write_into(&mut tx).await.unwrap();
        drop(tx);
        let mut out = Vec::new();
        rx.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn simple_ok_response() {
        let s = render(Response::new(StatusCode::Ok).body("Hello")).await;
        assert!(s.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.ends_with("\r\n\r\nHello"));
    }

    #[tokio::test]
    async fn custom_header() {
        let r = Response::new(StatusCode::Ok)
            .header("X-Request-Id", "abc-123")
            .body("ok");
        let s = render(r).await;
        assert!(s.contains("X-Request-Id: abc-123\r\n"));
    }

    #[tokio::test]
    async fn no_body_no_content_type() {
        let s = render(Response::new(StatusCode::NoContent)).await;
        assert!(!s.contains("Content-Type"));
        assert!(s.contains("Content-Length: 0\r\n"));
    }

    #[tokio::test]
    async fn connection_close() {
        let s = render(Response::new(StatusCode::Ok).keep_alive(false)).await;
        assert!(s.contains("Connection: close\r\n"));
    }

    #[tokio::test]
    async fn streamed_body_uses_chunked_encoding() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"hello")),
            Ok(Bytes::from_static(b" world")),
        ]);
        let r = Response::new(StatusCode::Ok)
            .header("Content-Type", "text/event-stream")
            .stream(Box::pin(chunks));
        let s = render(r).await;
        assert!(s.contains("Transfer-Encoding: chunked\r\n"));
        assert!(!s.contains("Content-Length"));
        assert!(s.contains("5\r\nhello\r\n"));
        assert!(s.contains("6\r\n world\r\n"));
        assert!(s.ends_with("0\r\n\r\n"));
    }

    #[tokio::test]
    async fn streamed_body_error_terminates_cleanly() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::other("upstream went away")),
            Ok(Bytes::from_static(b"never sent")),
        ]);
        let r = Response::new(StatusCode::Ok).stream(Box::pin(chunks));
        let s = render(r).await;
        assert!(s.contains("7\r\npartial\r\n"));
        assert!(!s.contains("never sent"));
        assert!(s.ends_with("0\r\n\r\n"));
    }

    #[tokio::test]
    async fn not_found() {
        let s = render(Response::new(StatusCode::NotFound).body("Not Found")).await;
        assert!(s.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }
}
