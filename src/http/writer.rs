//! Wire assembly and body transmission.
//!
//! Responses below the MTU go out with a Content-Length in one write;
//! larger bodies switch to chunked transfer in MTU-sized pieces. Output
//! sniffed as gzip is always chunked: the body goes out in a single write
//! followed by the chunk terminator.

use crate::http::response::{status_text, ResponseEnvelope};
use bytes::{BufMut, BytesMut};
use std::time::SystemTime;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const HTTP_VERSION: &str = "HTTP/1.1";
const SERVER_HEADER: &str = concat!("pagelet/", env!("CARGO_PKG_VERSION"));

/// Builds the status line and header block for an envelope.
///
/// Only 2xx responses carry the full header set; 304 carries the caching
/// subset, the 44x range is the bare connection-close line, and everything
/// else is status line plus handler headers.
pub fn serialize_head(env: &ResponseEnvelope, cache_max_age_secs: u64) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256);

    match env.status {
        // A proper 444 is just the bare code, no status line and no headers.
        440..=449 => {
            buf.put_slice(b"444\r\n\r\n");
        }
        200..=299 => {
            buf.put_slice(
                format!("{} {}\r\n", HTTP_VERSION, status_text(env.status)).as_bytes(),
            );
            put_common_headers(&mut buf);
            if !env.body.is_empty() {
                buf.put_slice(
                    format!("Content-Type: {}; charset=utf-8\r\n", env.content_type).as_bytes(),
                );
            }
            if !env.extra_headers.is_empty() {
                buf.put_slice(env.extra_headers.as_bytes());
                buf.put_slice(b"\r\n");
            }
            put_cache_control(&mut buf, cache_max_age_secs);
            if let Some(tag) = &env.etag {
                buf.put_slice(format!("ETag: \"{}\"\r\n", tag).as_bytes());
            }
            if env.gzip {
                buf.put_slice(b"Content-Encoding: gzip\r\nTransfer-Encoding: chunked\r\n");
            } else if env.chunked {
                buf.put_slice(b"Transfer-Encoding: chunked\r\n");
            } else {
                buf.put_slice(format!("Content-Length: {}\r\n", env.body.len()).as_bytes());
            }
            buf.put_slice(b"\r\n");
        }
        304 => {
            buf.put_slice(format!("{} {}\r\n", HTTP_VERSION, status_text(304)).as_bytes());
            put_common_headers(&mut buf);
            put_cache_control(&mut buf, cache_max_age_secs);
            if let Some(tag) = &env.etag {
                buf.put_slice(format!("ETag: \"{}\"\r\n", tag).as_bytes());
            }
            buf.put_slice(b"\r\n");
        }
        _ => {
            buf.put_slice(
                format!("{} {}\r\n", HTTP_VERSION, status_text(env.status)).as_bytes(),
            );
            if !env.extra_headers.is_empty() {
                buf.put_slice(env.extra_headers.as_bytes());
                buf.put_slice(b"\r\n");
            }
            buf.put_slice(b"\r\n");
        }
    }
    buf
}

fn put_common_headers(buf: &mut BytesMut) {
    buf.put_slice(format!("Server: {}\r\n", SERVER_HEADER).as_bytes());
    buf.put_slice(
        format!("Date: {}\r\n", httpdate::fmt_http_date(SystemTime::now())).as_bytes(),
    );
    buf.put_slice(b"Connection: close\r\n");
}

fn put_cache_control(buf: &mut BytesMut, max_age_secs: u64) {
    buf.put_slice(
        format!(
            "Cache-Control: private, max-age={}, no-cache, must-revalidate\r\n",
            max_age_secs
        )
        .as_bytes(),
    );
}

/// Writes head and body to the stream, applying the envelope's transfer
/// encoding. HEAD responses stop after the head: the headers still
/// describe the full body, but none of it goes out.
pub async fn write_envelope<W: AsyncWrite + Unpin>(
    stream: &mut W,
    env: &ResponseEnvelope,
    cache_max_age_secs: u64,
    mtu: usize,
) -> anyhow::Result<()> {
    let head = serialize_head(env, cache_max_age_secs);
    stream.write_all(&head).await?;

    if !env.suppress_body && !env.body.is_empty() {
        if env.gzip {
            stream.write_all(&env.body).await?;
            stream.write_all(b"\r\n0\r\n").await?;
        } else if env.chunked {
            for chunk in env.body.chunks(mtu.max(1)) {
                stream
                    .write_all(format!("{:x}\r\n", chunk.len()).as_bytes())
                    .await?;
                stream.write_all(chunk).await?;
                stream.write_all(b"\r\n").await?;
            }
            stream.write_all(b"0\r\n").await?;
        } else {
            stream.write_all(&env.body).await?;
        }
    }

    stream.flush().await?;
    Ok(())
}
