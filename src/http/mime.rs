//! Magic-byte content-type sniffing.
//!
//! When a handler does not set an explicit Content-Type, the first bytes of
//! its output are matched against a fixed table of signatures. This is a
//! best-effort guess, not a validator; anything unrecognized is text/plain.

/// Guesses a content type from the leading bytes of a response body.
///
/// Only meaningful for bodies of at least two bytes; callers should fall
/// back to `text/plain` for shorter output.
pub fn sniff(body: &[u8]) -> &'static str {
    if body.len() < 2 {
        return "text/plain";
    }
    let last = body[body.len() - 1];
    match body[0] {
        0x00 => {
            if body.len() > 3 && body[1] == 0x00 && body[2] == 0x01 {
                "image/x-icon"
            } else if body.len() > 9 && &body[4..8] == b"ftyp" {
                "video/mp4"
            } else {
                "text/plain"
            }
        }
        b'[' if last == b']' => "application/json",
        b'{' if last == b'}' => "application/json",
        b'<' if last == b'>' => {
            // "<?x" prefix marks an XML declaration
            if body.len() > 3 && body[2] == b'x' {
                "text/xml"
            } else {
                "text/html"
            }
        }
        b'%' if body.len() > 4 && &body[1..4] == b"PDF" => "application/pdf",
        0x42 if body[1] == 0x4d => "image/bmp",
        0x47 if body[1] == 0x49 => "image/gif",
        0x49 if body[1] == 0x44 => "audio/mpeg",
        0x4d if body[1] == 0x54 => "audio/midi",
        0x4f if body[1] == 0x67 => "audio/ogg",
        0x66 if body[1] == 0xfc => "audio/flac",
        0x89 if body[1] == 0x50 => "image/png",
        0xff if body[1] == 0xd8 => "image/jpeg",
        0xff if body[1] == 0xfb => "audio/mpeg",
        _ => "text/plain",
    }
}

/// Gzip is not a MIME type; a gzip signature instead forces
/// `Content-Encoding: gzip` plus chunked transfer on the wire.
pub fn is_gzip(body: &[u8]) -> bool {
    body.len() >= 2 && body[0] == 0x1f && (body[1] == 0x8b || body[1] == 0x3f)
}
