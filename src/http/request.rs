//! Parsed-request representation.

/// HTTP request methods recognized by the server.
///
/// The parser disambiguates methods from the first one or two bytes of the
/// request line. Anything else parses as `Other` and is answered with 501.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Delete,
    /// Unrecognized method; parsing continues but the response is 501.
    Other,
}

impl Method {
    /// Resolves a method from the first two bytes of the request line.
    /// Matching is case-insensitive; `P` needs the second byte to split
    /// PUT from POST.
    pub fn from_initials(m1: u8, m2: u8) -> Self {
        match m1.to_ascii_uppercase() {
            b'G' => Method::Get,
            b'H' => Method::Head,
            b'D' => Method::Delete,
            b'P' => match m2.to_ascii_uppercase() {
                b'U' => Method::Put,
                b'O' => Method::Post,
                _ => Method::Other,
            },
            _ => Method::Other,
        }
    }

    /// GET and HEAD are the only cacheable methods; only they carry ETags.
    pub fn is_cacheable(self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

/// One fully parsed request, immutable once the parser returns it.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub method: Method,
    /// Path with neither the leading slash nor the query marker.
    pub path: String,
    /// Everything between the query character and the first space, or empty.
    pub query_string: String,
    /// All header lines, CRLF-joined, exactly as received.
    pub raw_headers: String,
    /// Client IP from X-Forwarded-For / X-Real-IP, if either was present.
    pub forwarded_ip: Option<String>,
    pub user_agent: String,
    /// If-None-Match value with surrounding quotes stripped.
    pub if_none_match: Option<String>,
    pub content_length: Option<usize>,
    pub body: String,
}

impl ParsedRequest {
    /// File uploads are dispatched to a page's post-file callback when the
    /// header block advertises a multipart form.
    pub fn is_multipart(&self) -> bool {
        self.raw_headers.contains("multipart/form-data")
    }
}
