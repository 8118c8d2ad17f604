use log::{error, info, warn};
use std::io;
use tokio::net::TcpListener;

use crate::auth::TokenStore;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::AppState;
use crate::server::routes::create_router;
use crate::tasks::BackgroundTasks;
use crate::transfer::FileService;

pub struct Server {
    listener: TcpListener,
    state: AppState,
    address: String,
}

impl Server {
    /// Validate configuration, prepare the storage tree, load tokens and bind.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let service = FileService::new(&config);
        service.prepare_directories().await?;
        info!(
            "Storage root: {} (temp: {})",
            service.storage_root().display(),
            service.temp_root().display()
        );

        let tokens = TokenStore::load(&config.tokens_file_path()).await?;
        if tokens.is_empty() {
            warn!("No API tokens configured; every authenticated route will answer 401");
        }

        let address = config.listen_address();
        let listener = TcpListener::bind(address.as_str()).await.map_err(|e| {
            error!("Failed to bind to {}: {}", address, e);
            io::Error::new(e.kind(), format!("cannot bind {}: {}", address, e))
        })?;
        info!("Server bound to {}", address);

        Ok(Self {
            listener,
            state: AppState::new(service, tokens),
            address,
        })
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        self.state.service.tasks()
    }

    /// Serve until Ctrl-C, then let deferred work finish.
    pub async fn start(self) -> Result<(), ServerError> {
        info!("Starting RAX file server on {}", self.address);

        let tasks = self.tasks().clone();
        let router = create_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!(
            "Server stopped; waiting for {} background task(s)",
            tasks.pending()
        );
        tasks.wait_idle().await;
        info!("Shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server just runs until killed.
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
