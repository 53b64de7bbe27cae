//! Per-connection request pipeline.
//!
//! Each accepted socket serves exactly one request: read and parse, route,
//! check out the client's page instance, invoke the handler, render, write,
//! close. Resource-limit violations (oversized query or header block) are
//! normal control flow ending in 414/431; anything else that fails after
//! the socket is open gets a best-effort bare 444 and a log line, never
//! more.

use crate::http::parser::{parse_request, ParseError, RequestReader};
use crate::http::request::Method;
use crate::http::response::{render, RenderInput, ResponseEnvelope};
use crate::http::{etag, writer};
use crate::server::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Deadline for putting the whole response on the wire.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
}

impl Connection {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr, state: Arc<ServerState>) -> Self {
        Self {
            stream,
            peer,
            state,
        }
    }

    /// Runs the request/response cycle, downgrading any pipeline failure
    /// to a best-effort 444 so the listener pool never sees it.
    pub(crate) async fn run(mut self) -> anyhow::Result<()> {
        let result = self.serve().await;
        if let Err(e) = &result {
            tracing::error!(peer = %self.peer, error = %e, "connection failed, closing with 444");
            let _ = self.stream.write_all(b"444\r\n\r\n").await;
        }
        let _ = self.stream.shutdown().await;
        result
    }

    async fn serve(&mut self) -> anyhow::Result<()> {
        let cfg = self.state.config.clone();
        let mut reader = RequestReader::new(&mut self.stream);
        let parsed = match parse_request(&mut reader, cfg.query_char, cfg.mtu).await {
            Ok(req) => req,
            Err(ParseError::QueryTooLong) => {
                return self.write(ResponseEnvelope::error(414)).await;
            }
            Err(ParseError::HeadersTooLarge) => {
                return self.write(ResponseEnvelope::error(431)).await;
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            peer = %self.peer,
            method = ?parsed.method,
            path = %parsed.path,
            query = %parsed.query_string,
            "request parsed"
        );

        let page = self
            .state
            .routes
            .get(&parsed.path)
            .map(|entry| entry.value().clone());

        let envelope = match page {
            None => ResponseEnvelope::error(404),
            Some(_) if parsed.method == Method::Other => ResponseEnvelope::error(501),
            Some(page) => {
                let user_ip = parsed
                    .forwarded_ip
                    .clone()
                    .unwrap_or_else(|| self.peer.ip().to_string());
                let key = etag::client_key(&user_ip, &parsed.user_agent);
                let instance = self.state.cache.checkout(&page, key);

                // Header assignment and handler invocation stay under one
                // lock acquisition, so a same-client race cannot observe
                // half-updated scoped fields.
                let mut guard = instance.lock().await;
                guard.refresh(
                    page.callbacks(),
                    parsed.raw_headers.clone(),
                    user_ip.clone(),
                    parsed.user_agent.clone(),
                );
                let handler = guard.handler_for(parsed.method, parsed.is_multipart());
                let output = match handler {
                    Some(h) => h(&mut guard, &parsed.query_string, &parsed.body).into_bytes(),
                    None => Vec::new(),
                };
                let extra_headers = if guard.headers != parsed.raw_headers {
                    guard.headers.clone()
                } else {
                    String::new()
                };
                drop(guard);

                render(
                    &RenderInput {
                        method: parsed.method,
                        query_string: &parsed.query_string,
                        user_ip: &user_ip,
                        user_agent: &parsed.user_agent,
                        if_none_match: parsed.if_none_match.as_deref(),
                    },
                    output,
                    extra_headers,
                    cfg.mtu,
                )
            }
        };

        tracing::debug!(peer = %self.peer, status = envelope.status, "response rendered");
        self.write(envelope).await
    }

    async fn write(&mut self, envelope: ResponseEnvelope) -> anyhow::Result<()> {
        let cfg = &self.state.config;
        timeout(
            WRITE_TIMEOUT,
            writer::write_envelope(
                &mut self.stream,
                &envelope,
                cfg.cache_max_age_ms / 1000,
                cfg.mtu,
            ),
        )
        .await
        .map_err(|_| anyhow::anyhow!("socket write timed out"))?
    }
}
