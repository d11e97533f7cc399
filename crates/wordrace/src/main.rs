use tracing_subscriber::EnvFilter;
use wordrace::prelude::*;

#[tokio::main]
async fn main() -> Result<(), WordraceError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;
    let server = WordraceServer::builder().config(config).build().await?;
    let ws = server.local_addr()?;
    tracing::info!(%ws, http = ?server.http_addr(), "wordrace listening");
    server.run().await
}
