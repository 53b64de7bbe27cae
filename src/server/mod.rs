//! Server surface: route administration and the listener pool.

pub mod listener;

use crate::cache::InstanceCache;
use crate::config::Config;
use crate::page::Page;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// State shared by every connection task: the route table and the page
/// instance cache are the only process-wide mutable resources.
pub(crate) struct ServerState {
    pub routes: DashMap<String, Arc<Page>>,
    pub cache: InstanceCache,
    pub config: Config,
}

/// The server: owns the route table and, once started, the listener pool.
///
/// Route administration is safe while requests are in flight; each update
/// is atomic with respect to lookups.
pub struct Server {
    state: Arc<ServerState>,
    shutdown: watch::Sender<bool>,
    running: Arc<AtomicBool>,
    local_addr: Arc<Mutex<Option<SocketAddr>>>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let cache = InstanceCache::new(config.cache_max_age());
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Arc::new(ServerState {
                routes: DashMap::new(),
                cache,
                config,
            }),
            shutdown,
            running: Arc::new(AtomicBool::new(false)),
            local_addr: Arc::new(Mutex::new(None)),
        }
    }

    /// Registers a page; an existing page at the same path is replaced.
    pub fn add_route(&self, page: Page) {
        self.state.routes.insert(page.path().to_string(), Arc::new(page));
    }

    pub fn add_routes(&self, pages: impl IntoIterator<Item = Page>) {
        for page in pages {
            self.add_route(page);
        }
    }

    /// Removing an unregistered path is a no-op.
    pub fn remove_route(&self, path: &str) {
        self.state.routes.remove(path);
    }

    pub fn remove_routes<'a>(&self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            self.remove_route(path);
        }
    }

    pub fn clear_routes(&self) {
        self.state.routes.clear();
    }

    /// Binds the listening socket and spawns the accept pool. Returns once
    /// the socket is bound; serving continues in the background until
    /// `stop`.
    pub async fn start(&self) -> anyhow::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            anyhow::bail!("server already running");
        }
        let listener = tokio::net::TcpListener::bind(&self.state.config.listen_addr).await?;
        let addr = listener.local_addr()?;
        *self.local_addr.lock().unwrap() = Some(addr);
        tracing::info!(%addr, "listening");

        let state = self.state.clone();
        let shutdown_rx = self.shutdown.subscribe();
        let running = self.running.clone();
        tokio::spawn(async move {
            listener::run(listener, state, shutdown_rx).await;
            running.store(false, Ordering::SeqCst);
        });
        Ok(())
    }

    /// Closes the listening socket; in-flight connections finish their
    /// single request/response cycle.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Actual bound address, useful when configured with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }
}
