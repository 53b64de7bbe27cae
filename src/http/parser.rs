//! Single-pass streaming request parser.
//!
//! The request is consumed byte-by-byte off the socket, never buffered
//! whole: the method is resolved from its first two bytes, the path and
//! query accumulate until the first space, and only an allow-listed set of
//! headers is decoded while every line streams into one raw-headers string.
//! Bodies without a declared Content-Length are drained best-effort: only
//! bytes already available on the stream are taken, which deliberately does
//! not decode chunked request framing.

use crate::http::request::{Method, ParsedRequest};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// Per-read deadline on the inbound socket.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum ParseError {
    /// Query string (or path) ran past the configured MTU; answered 414.
    QueryTooLong,
    /// Header block ran past the configured MTU; answered 431.
    HeadersTooLarge,
    /// Stream ended before the request was complete.
    UnexpectedEof,
    Io(std::io::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::QueryTooLong => write!(f, "query string exceeds MTU"),
            ParseError::HeadersTooLarge => write!(f, "header block exceeds MTU"),
            ParseError::UnexpectedEof => write!(f, "stream ended mid-request"),
            ParseError::Io(e) => write!(f, "read error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e)
    }
}

/// Buffered byte-at-a-time reader over the connection stream.
pub struct RequestReader<R> {
    stream: R,
    buf: [u8; 4096],
    pos: usize,
    end: usize,
}

impl<R: AsyncRead + Unpin> RequestReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            buf: [0u8; 4096],
            pos: 0,
            end: 0,
        }
    }

    async fn fill(&mut self) -> Result<usize, ParseError> {
        let n = timeout(READ_TIMEOUT, self.stream.read(&mut self.buf))
            .await
            .map_err(|_| {
                ParseError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "socket read timed out",
                ))
            })??;
        self.pos = 0;
        self.end = n;
        Ok(n)
    }

    /// Next byte off the stream, `None` at end of stream.
    async fn next_byte(&mut self) -> Result<Option<u8>, ParseError> {
        if self.pos == self.end && self.fill().await? == 0 {
            return Ok(None);
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    /// Reads exactly `n` bytes, looping on partial reads. The initial
    /// allocation is capped at `cap`: the declared length is untrusted, so
    /// memory is committed only as body bytes actually arrive.
    async fn read_exact_body(&mut self, n: usize, cap: usize) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::with_capacity(n.min(cap));
        while out.len() < n {
            if self.pos == self.end && self.fill().await? == 0 {
                return Err(ParseError::UnexpectedEof);
            }
            let take = (n - out.len()).min(self.end - self.pos);
            out.extend_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
        }
        Ok(out)
    }

    /// Drains whatever is immediately available without blocking further.
    /// A zero-length poll window mirrors "no more data ready means end of
    /// body" for requests that declared no Content-Length.
    async fn drain_available(&mut self) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.buf[self.pos..self.end]);
        self.pos = self.end;
        let mut tmp = [0u8; 4096];
        loop {
            match timeout(Duration::ZERO, self.stream.read(&mut tmp)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => out.extend_from_slice(&tmp[..n]),
                Ok(Err(e)) => return Err(ParseError::Io(e)),
                Err(_) => break, // nothing ready right now
            }
        }
        Ok(out)
    }
}

/// Parses one request off the stream.
///
/// `query_char` splits path from query string; `mtu` bounds both the
/// accumulated query string and the header block.
pub async fn parse_request<R: AsyncRead + Unpin>(
    reader: &mut RequestReader<R>,
    query_char: char,
    mtu: usize,
) -> Result<ParsedRequest, ParseError> {
    let qc = query_char as u8;

    // Method from the first two bytes.
    let m1 = reader.next_byte().await?.ok_or(ParseError::UnexpectedEof)?;
    let m2 = reader.next_byte().await?.ok_or(ParseError::UnexpectedEof)?;
    let method = Method::from_initials(m1, m2);

    // Skip the rest of the method token and the leading slash.
    loop {
        match reader.next_byte().await? {
            Some(b' ') => {
                reader.next_byte().await?; // the '/'
                break;
            }
            Some(b'\r') | None => return Err(ParseError::UnexpectedEof),
            Some(_) => {}
        }
    }

    // Path and query string, split on the first query character strictly
    // before the space that ends the target.
    let mut path = String::new();
    let mut accum = String::new();
    let mut saw_query_char = false;
    loop {
        match reader.next_byte().await? {
            Some(b) if b == qc && !saw_query_char => {
                path = std::mem::take(&mut accum);
                saw_query_char = true;
            }
            Some(b' ') | Some(b'\r') | None => break,
            Some(b) => {
                accum.push(b as char);
                if accum.len() > mtu {
                    return Err(ParseError::QueryTooLong);
                }
            }
        }
    }
    let query_string = if saw_query_char {
        accum
    } else {
        path = accum;
        String::new()
    };

    // Trailing HTTP-version token: discarded.
    loop {
        match reader.next_byte().await? {
            Some(b'\n') | None => break,
            Some(_) => {}
        }
    }

    // Header block: line-by-line until the empty line. Only the allow-list
    // is decoded; the first-byte dispatch is case-sensitive for everything
    // past the initial letter, so lowercase names pass through verbatim.
    let mut raw_headers = String::new();
    let mut forwarded_ip = None;
    let mut user_agent = String::new();
    let mut if_none_match = None;
    let mut content_length = None;
    loop {
        let mut line = String::new();
        let mut eof = false;
        loop {
            match reader.next_byte().await? {
                Some(b'\n') => break,
                Some(b'\r') => {}
                Some(b) => line.push(b as char),
                None => {
                    eof = true;
                    break;
                }
            }
            if raw_headers.len() + line.len() > mtu {
                return Err(ParseError::HeadersTooLarge);
            }
        }
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            match name.as_bytes().first().copied().unwrap_or(0) {
                b'X' | b'x' => {
                    if name == "X-Forwarded-For" || name == "X-Real-IP" {
                        // First element of a comma-separated proxy chain.
                        if let Some(first) = value.trim().split(',').next() {
                            forwarded_ip = Some(first.trim().to_string());
                        }
                    }
                }
                b'U' | b'u' => {
                    if name == "User-Agent" {
                        user_agent = value.trim().to_string();
                    }
                }
                b'I' => {
                    if name == "If-None-Match" {
                        if_none_match = Some(value.trim().trim_matches('"').to_string());
                    }
                }
                b'C' => {
                    if name == "Content-Length" {
                        content_length = value.trim().parse::<usize>().ok();
                    }
                }
                _ => {}
            }
        }
        raw_headers.push_str(&line);
        raw_headers.push_str("\r\n");
        if eof {
            break;
        }
    }

    // Body: exact read when a length was declared, best-effort drain
    // otherwise.
    let body_bytes = match content_length {
        Some(n) if n > 0 => reader.read_exact_body(n, mtu).await?,
        Some(_) => Vec::new(),
        None => reader.drain_available().await?,
    };
    let body = String::from_utf8_lossy(&body_bytes).into_owned();

    Ok(ParsedRequest {
        method,
        path,
        query_string,
        raw_headers,
        forwarded_ip,
        user_agent,
        if_none_match,
        content_length,
        body,
    })
}
