//! pagelet - a from-scratch HTTP/1.1 page server.
//!
//! Routes are "pages": a path plus optional verb callbacks. The server
//! talks directly to raw TCP sockets, parses requests byte-by-byte, keeps
//! a per-client instance of each page's state, and emits spec-compliant
//! responses with conditional caching and chunked transfer. One request
//! per connection, always.
//!
//! ```ignore
//! use pagelet::{Config, Page, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::new(Config::default());
//!     server.add_route(Page::new("echo").on_get(|_, query, _| query.to_string()));
//!     server.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.stop();
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod page;
pub mod server;

pub use config::Config;
pub use page::{Page, PageInstance};
pub use server::Server;
