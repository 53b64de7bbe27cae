use pagelet::http::request::Method;
use pagelet::http::response::{render, RenderInput, ResponseEnvelope};
use pagelet::http::writer::{serialize_head, write_envelope};

const CACHE_SECS: u64 = 3600;

fn rendered(method: Method, output: &[u8], mtu: usize) -> ResponseEnvelope {
    render(
        &RenderInput {
            method,
            query_string: "q",
            user_ip: "1.2.3.4",
            user_agent: "tester",
            if_none_match: None,
        },
        output.to_vec(),
        String::new(),
        mtu,
    )
}

async fn wire(env: &ResponseEnvelope, mtu: usize) -> Vec<u8> {
    let mut out = Vec::new();
    write_envelope(&mut out, env, CACHE_SECS, mtu).await.unwrap();
    out
}

#[tokio::test]
async fn success_head_carries_the_full_block() {
    let env = rendered(Method::Get, b"hello", 65535);
    let head = String::from_utf8(serialize_head(&env, CACHE_SECS).to_vec()).unwrap();

    assert!(head.starts_with("HTTP/1.1 200 Ok\r\n"));
    assert!(head.contains("Server: pagelet/"));
    assert!(head.contains("Date: "));
    assert!(head.contains("Connection: close\r\n"));
    assert!(head.contains("Content-Type: text/plain; charset=utf-8\r\n"));
    assert!(head.contains("Cache-Control: private, max-age=3600, no-cache, must-revalidate\r\n"));
    assert!(head.contains("ETag: \""));
    assert!(head.contains("Content-Length: 5\r\n"));
    assert!(head.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn fixed_length_body_follows_the_head() {
    let env = rendered(Method::Get, b"hello", 65535);
    let out = wire(&env, 65535).await;
    let text = String::from_utf8(out).unwrap();

    assert!(text.ends_with("\r\n\r\nhello"));
}

#[tokio::test]
async fn not_modified_has_no_body_headers() {
    let tag = rendered(Method::Get, b"hello", 65535).etag.unwrap();
    let env = render(
        &RenderInput {
            method: Method::Get,
            query_string: "q",
            user_ip: "1.2.3.4",
            user_agent: "tester",
            if_none_match: Some(&tag),
        },
        b"hello".to_vec(),
        String::new(),
        65535,
    );
    let out = wire(&env, 65535).await;
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("HTTP/1.1 304 Not modified\r\n"));
    assert!(!text.contains("Content-Length"));
    assert!(!text.contains("Content-Type"));
    assert!(text.contains(&format!("ETag: \"{}\"", tag)));
    assert!(text.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn error_envelope_is_status_line_only() {
    let out = wire(&ResponseEnvelope::error(404), 65535).await;
    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n");

    let out = wire(&ResponseEnvelope::error(414), 65535).await;
    assert_eq!(out, b"HTTP/1.1 414 Request-URI Too Long\r\n\r\n");
}

#[tokio::test]
async fn connection_close_signal_is_bare() {
    let out = wire(&ResponseEnvelope::error(444), 65535).await;
    assert_eq!(out, b"444\r\n\r\n");
}

#[tokio::test]
async fn large_body_is_chunked_at_the_mtu() {
    let mtu = 4;
    let env = rendered(Method::Post, b"abcdefghij", mtu);
    assert!(env.chunked);

    let out = wire(&env, mtu).await;
    let text = String::from_utf8(out).unwrap();
    let body = text.split("\r\n\r\n").nth(1).unwrap();

    assert!(text.contains("Transfer-Encoding: chunked\r\n"));
    assert!(!text.contains("Content-Length"));
    assert_eq!(body, "4\r\nabcd\r\n4\r\nefgh\r\n2\r\nij\r\n0\r\n");
}

#[tokio::test]
async fn gzip_body_is_one_write_plus_terminator() {
    let payload = vec![0x1f, 0x8b, 0x08, 0x00, 0x42];
    let env = rendered(Method::Post, &payload, 65535);
    assert!(env.gzip);

    let out = wire(&env, 65535).await;
    let text = String::from_utf8_lossy(&out);

    assert!(text.contains("Content-Encoding: gzip\r\n"));
    assert!(text.contains("Transfer-Encoding: chunked\r\n"));
    assert!(out.ends_with(b"\r\n0\r\n"));
    let head_end = text.find("\r\n\r\n").unwrap() + 4;
    assert_eq!(&out[head_end..head_end + payload.len()], &payload[..]);
}

#[tokio::test]
async fn head_request_sends_headers_only() {
    let env = rendered(Method::Head, b"hello", 65535);
    let out = wire(&env, 65535).await;
    let text = String::from_utf8(out).unwrap();

    // Length still describes the body that a GET would have returned.
    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
}
