//! Server-side components of the users gRPC service.
//!
//! ## Submodules
//!
//! - [`binder`] - Registers the users, health and reflection services into
//!   the dispatch table.
//! - [`config`] - CLI and environment configuration.
//! - [`health`] - Serving status registry backing `grpc.health.v1.Health`.
//! - [`lifecycle`] - Listener ownership and the accept loop.
//! - [`service`] - The `users.Users` implementation.
//! - [`telemetry`] - Logging and optional OpenTelemetry export.

pub mod binder;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod service;
pub mod telemetry;
