//! HTTP server for the boundary API

use super::api::build_router;
use crate::config::ServerConfig;
use crate::store::StoreHandle;
use anyhow::Result;
use std::future::Future;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Boundary server over a shared store
pub struct BoundaryServer {
    handle: StoreHandle,
    config: ServerConfig,
}

impl BoundaryServer {
    pub fn new(handle: StoreHandle, config: ServerConfig) -> Self {
        Self { handle, config }
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves, then drain connections and tear the
    /// store down
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        info!("Boundary API listening on {}", listener.local_addr()?);
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.handle.clone());
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        });
        let mut task = tokio::spawn(async move { server.await });

        tokio::select! {
            result = &mut task => result??,
            _ = shutdown => {
                info!("Shutdown requested, draining connections");
                let _ = stop_tx.send(());
                match tokio::time::timeout(self.config.shutdown_timeout, &mut task).await {
                    Ok(result) => result??,
                    Err(_) => {
                        warn!(timeout = ?self.config.shutdown_timeout, "Shutdown timed out, aborting server");
                        task.abort();
                    }
                }
            }
        }

        self.handle.teardown().await;
        info!("Boundary API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureManager, StoreConfig};
    use crate::store::SocialStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_tears_store_down() {
        let store = SocialStore::new(StoreConfig::default(), FeatureManager::new()).unwrap();
        let handle = StoreHandle::new(store, Default::default());
        let config = ServerConfig { shutdown_timeout: Duration::from_secs(1), ..Default::default() };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(BoundaryServer::new(handle.clone(), config).serve(listener, async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert!(handle.read(|s| s.is_closed()).await);
    }
}
