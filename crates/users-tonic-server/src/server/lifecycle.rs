//! Listener and dispatch loop ownership.
//!
//! The server moves through three states before it runs:
//!
//! ```text
//! Unstarted --bind--> Bound --configure--> Configured --serve--> (serving)
//! ```
//!
//! Each transition consumes the previous state, so services can only be
//! registered against a bound listener and the accept loop can only start
//! once the health registry reports the users service as serving. Serving
//! never completes successfully: any error out of bind or the accept loop is
//! fatal and is handed back to the caller.

use crate::server::{
    binder::{USERS_SERVICE_NAME, register_services},
    config::ServerConfig,
    health::{HealthRegistry, ServingStatus},
    service::handler::UserService,
};
use anyhow::Context;
use core::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{
    service::{Routes, RoutesBuilder},
    transport::Server,
};
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Nothing acquired yet.
#[derive(Debug)]
pub struct Unstarted;

/// The TCP listener is bound.
#[derive(Debug)]
pub struct Bound {
    listener: TcpListener,
}

/// Services are registered and initial health is published.
pub struct Configured {
    listener: TcpListener,
    routes: Routes,
}

impl core::fmt::Debug for Configured {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Configured")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ServerLifecycle<S> {
    config: ServerConfig,
    state: S,
}

impl ServerLifecycle<Unstarted> {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Unstarted,
        }
    }

    /// Binds the TCP listener on the configured address.
    pub async fn bind(self) -> anyhow::Result<ServerLifecycle<Bound>> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.listen_addr))?;

        Ok(ServerLifecycle {
            config: self.config,
            state: Bound { listener },
        })
    }
}

impl ServerLifecycle<Bound> {
    /// Address the listener actually bound to.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.state.listener.local_addr()?)
    }

    /// Registers every service against a fresh dispatch table and marks the
    /// users service as serving in `registry`.
    ///
    /// `health` must be the service returned alongside `registry` by
    /// [`HealthRegistry::new`].
    pub async fn configure(
        self,
        registry: &HealthRegistry,
        health: HealthServer<impl Health>,
    ) -> anyhow::Result<ServerLifecycle<Configured>> {
        let mut routes = RoutesBuilder::default();
        register_services(&mut routes, UserService::new(&self.config), health)?;

        registry
            .set_serving_status(USERS_SERVICE_NAME, ServingStatus::Serving)
            .await;

        Ok(ServerLifecycle {
            config: self.config,
            state: Configured {
                listener: self.state.listener,
                routes: routes.routes(),
            },
        })
    }
}

impl ServerLifecycle<Configured> {
    /// Runs the accept loop until it fails.
    pub async fn serve(self) -> anyhow::Result<Infallible> {
        let Configured { listener, routes } = self.state;
        log_startup_info(&listener, &self.config);

        Server::builder()
            .accept_http1(true)
            .http2_adaptive_window(Some(true))
            .layer(
                ServiceBuilder::new()
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    )
                    .layer(GrpcWebLayer::new()),
            )
            .add_routes(routes)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .context("serve loop failed")?;

        anyhow::bail!("serve loop exited unexpectedly")
    }
}

/// Binds, configures and serves with a fresh [`HealthRegistry`].
///
/// Only returns on a fatal error.
pub async fn run(config: ServerConfig) -> anyhow::Result<Infallible> {
    let (registry, health) = HealthRegistry::new();

    ServerLifecycle::new(config)
        .bind()
        .await?
        .configure(&registry, health)
        .await?
        .serve()
        .await
}

fn log_startup_info(listener: &TcpListener, config: &ServerConfig) {
    let addr = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| config.listen_addr.clone());

    if cfg!(debug_assertions) {
        tracing::info!("Starting users service on {} with full config: {:#?}", addr, config);
    } else {
        tracing::info!("Starting users service on {}", addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> ServerConfig {
        ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn binds_an_ephemeral_port() -> anyhow::Result<()> {
        let bound = ServerLifecycle::new(local_config()).bind().await?;
        assert_ne!(bound.local_addr()?.port(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn bind_failure_is_reported() -> anyhow::Result<()> {
        let taken = ServerLifecycle::new(local_config()).bind().await?;
        let config = ServerConfig {
            listen_addr: taken.local_addr()?.to_string(),
            ..ServerConfig::default()
        };

        let err = ServerLifecycle::new(config).bind().await.unwrap_err();
        assert!(err.to_string().starts_with("failed to bind"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_address_is_reported() {
        let config = ServerConfig {
            listen_addr: "not an address".to_string(),
            ..ServerConfig::default()
        };
        assert!(ServerLifecycle::new(config).bind().await.is_err());
    }

    #[tokio::test]
    async fn configure_marks_users_serving() -> anyhow::Result<()> {
        let (registry, health) = HealthRegistry::new();
        assert_eq!(
            registry.check(USERS_SERVICE_NAME),
            ServingStatus::ServiceUnknown
        );

        let _configured = ServerLifecycle::new(local_config())
            .bind()
            .await?
            .configure(&registry, health)
            .await?;

        assert_eq!(registry.check(USERS_SERVICE_NAME), ServingStatus::Serving);
        Ok(())
    }

    #[tokio::test]
    async fn every_state_is_debug() -> anyhow::Result<()> {
        let (registry, health) = HealthRegistry::new();
        let bound = ServerLifecycle::new(local_config()).bind().await?;
        assert!(format!("{bound:?}").contains("Bound"));

        let configured = bound.configure(&registry, health).await?;
        assert!(format!("{configured:?}").contains("Configured"));
        Ok(())
    }
}
