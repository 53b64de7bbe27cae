//! Page definitions and their per-client instances.
//!
//! A `Page` is a registered route: a path plus optional verb callbacks. The
//! definition itself is immutable once registered; every distinct client
//! gets its own `PageInstance` clone carrying request-scoped state, so
//! concurrent users never share mutable handler state.

use crate::http::request::Method;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handler output: plain text or a raw byte payload.
///
/// An empty output produces a 404; output prefixed with exactly three
/// digits and CRLF overrides the response status code.
pub struct Output(Vec<u8>);

impl Output {
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<String> for Output {
    fn from(s: String) -> Self {
        Output(s.into_bytes())
    }
}

impl From<&str> for Output {
    fn from(s: &str) -> Self {
        Output(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Output {
    fn from(b: Vec<u8>) -> Self {
        Output(b)
    }
}

/// A verb callback: `(instance, query_string, body) -> output`.
///
/// The instance gives handlers the inbound header block, client IP, and
/// user agent; reassigning `instance.headers` attaches extra response
/// headers.
pub type Handler = Arc<dyn Fn(&mut PageInstance, &str, &str) -> Output + Send + Sync>;

/// A page's callback set, cloned into every instance. Opaque outside the
/// crate; built through the `Page` setters.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub(crate) get: Option<Handler>,
    pub(crate) put: Option<Handler>,
    pub(crate) post: Option<Handler>,
    pub(crate) delete: Option<Handler>,
    pub(crate) post_file: Option<Handler>,
}

/// A registered route definition.
pub struct Page {
    path: String,
    callbacks: Callbacks,
}

impl Page {
    /// A page at `path`, given without a leading slash or query marker.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            callbacks: Callbacks::default(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn on_get<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&mut PageInstance, &str, &str) -> O + Send + Sync + 'static,
        O: Into<Output>,
    {
        self.callbacks.get = Some(Arc::new(move |inst, query, body| f(inst, query, body).into()));
        self
    }

    pub fn on_put<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&mut PageInstance, &str, &str) -> O + Send + Sync + 'static,
        O: Into<Output>,
    {
        self.callbacks.put = Some(Arc::new(move |inst, query, body| f(inst, query, body).into()));
        self
    }

    pub fn on_post<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&mut PageInstance, &str, &str) -> O + Send + Sync + 'static,
        O: Into<Output>,
    {
        self.callbacks.post = Some(Arc::new(move |inst, query, body| f(inst, query, body).into()));
        self
    }

    pub fn on_delete<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&mut PageInstance, &str, &str) -> O + Send + Sync + 'static,
        O: Into<Output>,
    {
        self.callbacks.delete = Some(Arc::new(move |inst, query, body| f(inst, query, body).into()));
        self
    }

    /// Callback for multipart form uploads; plain POSTs still go to
    /// `on_post`.
    pub fn on_post_file<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&mut PageInstance, &str, &str) -> O + Send + Sync + 'static,
        O: Into<Output>,
    {
        self.callbacks.post_file = Some(Arc::new(move |inst, query, body| f(inst, query, body).into()));
        self
    }

    /// Snapshot of the current callback set.
    pub fn callbacks(&self) -> Callbacks {
        self.callbacks.clone()
    }
}

/// Per-client clone of a page definition plus request-scoped fields.
///
/// Owned exclusively by one instance-cache entry; a request borrows it for
/// the duration of a single handler call.
pub struct PageInstance {
    pub(crate) callbacks: Callbacks,
    /// Inbound header block on entry to a handler; a handler may replace it
    /// to send extra response headers.
    pub headers: String,
    pub user_ip: String,
    pub user_agent: String,
    /// Handler scratch space. Unlike the request-scoped fields this
    /// persists across the client's requests, for as long as the instance
    /// stays in the cache.
    pub state: HashMap<String, String>,
    touched: Instant,
}

impl PageInstance {
    pub(crate) fn new(callbacks: Callbacks) -> Self {
        Self {
            callbacks,
            headers: String::new(),
            user_ip: String::new(),
            user_agent: String::new(),
            state: HashMap::new(),
            touched: Instant::now(),
        }
    }

    /// Brings the instance up to date for the current request. Callbacks
    /// are re-copied from the definition so administrative route changes
    /// take effect without cache invalidation.
    pub fn refresh(
        &mut self,
        callbacks: Callbacks,
        headers: String,
        user_ip: String,
        user_agent: String,
    ) {
        self.callbacks = callbacks;
        self.headers = headers;
        self.user_ip = user_ip;
        self.user_agent = user_agent;
        self.touched = Instant::now();
    }

    /// Time since a request last touched this instance.
    pub(crate) fn idle(&self) -> Duration {
        self.touched.elapsed()
    }

    /// Selects the callback for a verb; multipart POSTs prefer the
    /// post-file callback when one is registered.
    pub fn handler_for(&self, method: Method, multipart: bool) -> Option<Handler> {
        match method {
            Method::Get | Method::Head => self.callbacks.get.clone(),
            Method::Put => self.callbacks.put.clone(),
            Method::Post => {
                if multipart && self.callbacks.post_file.is_some() {
                    self.callbacks.post_file.clone()
                } else {
                    self.callbacks.post.clone()
                }
            }
            Method::Delete => self.callbacks.delete.clone(),
            Method::Other => None,
        }
    }
}
