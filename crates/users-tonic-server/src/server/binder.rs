//! Registration of every gRPC service the server exposes.

use crate::server::service::handler::UserService;
use tonic::{codec::CompressionEncoding, server::NamedService, service::RoutesBuilder};
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_reflection::server::Builder;
use users_tonic_core::proto::{FILE_DESCRIPTOR_SET, users_server::UsersServer};

/// Fully-qualified protocol name of the users service (`users.Users`).
pub const USERS_SERVICE_NAME: &str = <UsersServer<UserService> as NamedService>::NAME;

/// Registers the users, health and reflection services into `routes`.
///
/// Must be called once per dispatch table. Registering the same service twice
/// is not supported.
pub fn register_services(
    routes: &mut RoutesBuilder,
    users: UserService,
    health: HealthServer<impl Health>,
) -> anyhow::Result<()> {
    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    tracing::debug!(service = USERS_SERVICE_NAME, "Registering service");
    routes
        .add_service(build_users_service(users))
        .add_service(health)
        .add_service(reflection);

    Ok(())
}

fn build_users_service(service: UserService) -> UsersServer<UserService> {
    UsersServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::health::HealthRegistry;

    #[test]
    fn users_service_name_is_fully_qualified() {
        assert_eq!(USERS_SERVICE_NAME, "users.Users");
    }

    #[test]
    fn registers_all_services() -> anyhow::Result<()> {
        let (_registry, health) = HealthRegistry::new();
        let mut routes = RoutesBuilder::default();
        register_services(&mut routes, UserService::default(), health)?;
        let _routes = routes.routes();
        Ok(())
    }
}
