use std::future::Future;
use std::sync::Arc;

use tierds_remote::{BlockStore, DatastoreBlockStore};
use tierds_store::FlatfsDatastore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Block server.
pub struct BlockServer {
    config: ServerConfig,
    store: Arc<dyn BlockStore>,
}

impl BlockServer {
    pub fn new(config: ServerConfig, store: Arc<dyn BlockStore>) -> Self {
        Self { config, store }
    }

    /// Serve the flatfs directory named in `config`, creating it if needed.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let shard = config.shard()?;
        let flatfs = FlatfsDatastore::create_or_open(&config.store_path, shard, config.sync)?;
        Ok(Self::new(config, Arc::new(DatastoreBlockStore::new(flatfs))))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.store.clone())
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_with_shutdown(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, store = %self.config.store_path.display(), "block server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!(%addr, "block server stopped");
        Ok(())
    }
}
