use pagelet::{Config, Page, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let srv = Server::new(cfg);

    srv.add_route(Page::new("echo").on_get(|_, query, _| format!("echo: {}", query)));

    srv.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    srv.stop();

    Ok(())
}
