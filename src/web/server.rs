//! Web server for lanshare.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::{Result, ShareError};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::{create_health_router, create_router_with_rate_limit};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Password attempt limiter.
    rate_limit_state: Arc<RateLimitState>,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
    /// Expired-share sweep interval in seconds, 0 disables it.
    sweep_interval_secs: u64,
}

impl WebServer {
    /// Create a new web server with an in-memory registry.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_state(config, Arc::new(AppState::from_config(config)))
    }

    /// Create a new web server around existing application state.
    pub fn with_state(config: &Config, app_state: Arc<AppState>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse::<SocketAddr>()
            .map_err(|e| ShareError::Config(format!("invalid server address: {}", e)))?;

        Ok(Self {
            addr,
            app_state,
            rate_limit_state: Arc::new(RateLimitState::new(config.web.auth_rate_limit)),
            cors_origins: config.web.cors_origins.clone(),
            sweep_interval_secs: config.share.sweep_interval_secs,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(&self) -> Router {
        create_router_with_rate_limit(
            self.app_state.clone(),
            self.rate_limit_state.clone(),
            &self.cors_origins,
        )
        .merge(create_health_router())
        .layer(CompressionLayer::new())
    }

    /// Start the expired-share sweep.
    ///
    /// Lazy eviction already hides expired shares; the sweep frees shares
    /// nobody touches again, and sessions idle past `web.session_idle_minutes`.
    fn start_sweep_task(state: Arc<AppState>, interval_secs: u64) {
        if interval_secs == 0 {
            tracing::debug!("Expired-share sweep disabled");
            return;
        }

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let expired = state.registry.sweep_expired();
                for token in &expired {
                    state.sessions.forget_token(token);
                }
                if expired.is_empty() {
                    tracing::debug!("No expired shares to sweep");
                } else {
                    tracing::info!(removed = expired.len(), "Swept expired shares");
                }

                let idle = state.sessions.expire_idle();
                if idle > 0 {
                    tracing::debug!(removed = idle, "Dropped idle sessions");
                }
            }
        });
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_sweep_task(self.app_state.clone(), self.sweep_interval_secs);
        self.rate_limit_state.clone().start_cleanup_task();

        tracing::info!("Web server listening on http://{}", local_addr);
        Ok((listener, local_addr))
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let router = self.build_router();
        let (listener, _) = self.bind().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = self.build_router();
        let (listener, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
