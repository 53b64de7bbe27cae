//! Response rendering: status resolution, conditional caching, MIME
//! sniffing, and the closed status-line table.

use crate::http::request::Method;
use crate::http::{etag, mime};
use std::borrow::Cow;

/// Code-plus-reason text for the status line.
///
/// The table is closed: unknown codes fall back to a representative of
/// their class (unknown 4xx to 404, unknown 5xx to 502, unknown 3xx to
/// 200), with the 42x/49x ranges and the extension codes 511/520/598/599
/// given explicit phrases. 44x is the bare connection-close signal.
pub fn status_text(code: u16) -> Cow<'static, str> {
    let s: &'static str = match code {
        100..=199 => "100 Continue",
        200 => "200 Ok",
        201 => "201 Created",
        202 => "202 Accepted",
        203 => "203 Non-Authoritative Information",
        204 => "204 No Content",
        205 => "205 Reset Content",
        206 => "206 Partial Content",
        207..=299 => return Cow::Owned(code.to_string()),
        300 => "300 Multiple Choices",
        301 => "301 Moved Permanently",
        302 => "302 Found",
        303 => "303 See Other",
        304 => "304 Not modified",
        305 => "305 Use Proxy",
        306 => "306 Switch Proxy",
        307 => "307 Temporary Redirect",
        308 => "308 Permanent Redirect",
        309..=399 => "200 Ok",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        402 => "402 Payment Required",
        403 => "403 Forbidden",
        404 => "404 Not Found",
        405 => "405 Method Not Allowed",
        406 => "406 Not Acceptable",
        407 => "407 Proxy Authentication Required",
        408 => "408 Request Timeout",
        409 => "409 Conflict",
        410 => "410 Gone",
        411 => "411 Length Required",
        412 => "412 Precondition Failed",
        413 => "413 Payload Too Large",
        414 => "414 Request-URI Too Long",
        415 => "415 Unsupported Media Type",
        416 => "416 Requested Range Not Satisfiable",
        417 => "417 Expectation Failed",
        418 => "404 Not Found", // teapots are not served here
        419 => "419 Authentication Timeout",
        420 => "420 It's Time",
        421 => "421 Misdirected Request",
        422..=429 => "42x Strange error",
        430..=439 => "431 Request Header Fields Too Large",
        440..=449 => "444",
        450..=459 => "451 Unavailable For Legal Reasons",
        495 => "495 Cert Error",
        496 => "496 No Cert",
        497 => "497 HTTP to HTTPS",
        499 => "499 Client Closed Request",
        490..=498 => "49x Unhandled front-end server error",
        500 => "500 Internal Server Error",
        501 => "501 Not Implemented",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        504 => "504 Gateway Timeout",
        505 => "505 HTTP Version Not Supported",
        506 => "506 Variant Also Negotiates",
        510 => "510 Not Extended",
        511 => "511 Network Authentication Required",
        520 => "520 Unknown Error",
        598 => "598 Network Read Timeout Error",
        599 => "599 Network Connect Timeout Error",
        460..=489 => "404 Not Found",
        507..=597 => "502 Bad Gateway",
        _ => return Cow::Owned(code.to_string()),
    };
    Cow::Borrowed(s)
}

/// Everything the writer needs to put one response on the wire.
#[derive(Debug)]
pub struct ResponseEnvelope {
    pub status: u16,
    /// Sniffed or handler-declared content type; empty means no body type.
    pub content_type: String,
    pub gzip: bool,
    pub chunked: bool,
    pub etag: Option<String>,
    /// Extra response headers from the handler, CRLF-joined lines.
    pub extra_headers: String,
    pub body: Vec<u8>,
    /// HEAD: headers describe the full body, but none of it is written.
    pub suppress_body: bool,
}

impl ResponseEnvelope {
    /// Short-circuit envelope for parse/route failures: status only, no
    /// header echo, no body.
    pub fn error(status: u16) -> Self {
        Self {
            status,
            content_type: String::new(),
            gzip: false,
            chunked: false,
            etag: None,
            extra_headers: String::new(),
            body: Vec::new(),
            suppress_body: false,
        }
    }
}

/// Request-side inputs to rendering.
pub struct RenderInput<'a> {
    pub method: Method,
    pub query_string: &'a str,
    pub user_ip: &'a str,
    pub user_agent: &'a str,
    pub if_none_match: Option<&'a str>,
}

/// Turns a handler's raw output plus request metadata into an envelope.
///
/// Empty output renders as 404. The ETag is taken over the raw output
/// before the three-digit status override is stripped, so an override
/// prefix participates in the fingerprint.
pub fn render(
    input: &RenderInput<'_>,
    output: Vec<u8>,
    extra_headers: String,
    mtu: usize,
) -> ResponseEnvelope {
    let mut status: u16 = 404;
    let mut body = output;

    let mut tag = None;
    if input.method.is_cacheable() {
        let computed = etag::compute(input.query_string, input.user_ip, input.user_agent, &body);
        if input.if_none_match == Some(computed.as_str()) {
            status = 304;
        }
        tag = Some(computed);
    }

    if status != 304 && !body.is_empty() {
        status = strip_status_override(&mut body).unwrap_or(200);
    }

    let (declared_type, extra_headers) = extract_content_type(extra_headers);
    let gzip = mime::is_gzip(&body);
    let content_type = match declared_type {
        Some(t) => t,
        None => mime::sniff(&body).to_string(),
    };

    // These classes never carry content.
    if matches!(status, 100..=199 | 204 | 304 | 500..=599) {
        body.clear();
    }

    let chunked = gzip || body.len() >= mtu;

    ResponseEnvelope {
        status,
        content_type,
        gzip,
        chunked,
        etag: tag,
        extra_headers,
        body,
        suppress_body: input.method == Method::Head,
    }
}

/// A handler may force the status by prefixing its output with exactly
/// three digits and CRLF; the prefix is consumed.
fn strip_status_override(body: &mut Vec<u8>) -> Option<u16> {
    if body.len() >= 5
        && body[0].is_ascii_digit()
        && body[1].is_ascii_digit()
        && body[2].is_ascii_digit()
        && body[3] == b'\r'
        && body[4] == b'\n'
    {
        let code = std::str::from_utf8(&body[..3]).ok()?.parse().ok()?;
        body.drain(..5);
        Some(code)
    } else {
        None
    }
}

/// Pulls a content-type line out of the handler's extra headers so it is
/// emitted once via the dedicated Content-Type header, not duplicated.
fn extract_content_type(extra_headers: String) -> (Option<String>, String) {
    if extra_headers.is_empty() {
        return (None, extra_headers);
    }
    let mut declared = None;
    let kept: Vec<&str> = extra_headers
        .lines()
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-type:") {
                if declared.is_none() {
                    let start = line.len() - value.len();
                    declared = Some(line[start..].trim().to_string());
                }
                false
            } else {
                !line.is_empty()
            }
        })
        .collect();
    (declared, kept.join("\r\n"))
}
