use late_retriever::api::{create_router, AppState};
use late_retriever::application::RetrievalService;
use late_retriever::infrastructure::{init_tracing, Config, InMemoryTokenStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("api=debug,late_retriever=debug,tower_http=debug");

    let config = Config::load()?;
    info!(
        batch_size = config.retrieval.batch_size,
        key_field = %config.retrieval.key_field,
        "configuration loaded"
    );

    let store = Arc::new(InMemoryTokenStore::new());
    let retrieval = Arc::new(RetrievalService::new(store, config.retrieval.batch_size));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let app = create_router(AppState::new(retrieval, config));

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
