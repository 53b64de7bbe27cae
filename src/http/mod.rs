//! HTTP protocol implementation.
//!
//! A from-scratch HTTP/1.1 layer: requests are parsed byte-by-byte off the
//! socket, responses are assembled to exact wire bytes. One connection
//! carries one request; there is no keep-alive, pipelining, HTTP/2, or TLS.
//!
//! # Pipeline
//!
//! ```text
//! read ──▶ parse ──▶ route ──▶ instance cache ──▶ handler
//!                                                   │
//! close ◀── write ◀── render (status/ETag/MIME) ◀───┘
//! ```
//!
//! - **`parser`**: single-pass streaming request parser with a fixed header
//!   allow-list and MTU limits on query string and header block
//! - **`request`**: method resolution and the `ParsedRequest` type
//! - **`response`**: status resolution, conditional GET (ETag/304), the
//!   closed status-line table
//! - **`mime`**: magic-byte content-type sniffing
//! - **`etag`**: 32-bit fingerprints for client keys and conditional GET
//! - **`writer`**: header assembly plus fixed-length or chunked body writes
//! - **`connection`**: the per-connection orchestrator

pub mod connection;
pub mod etag;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
