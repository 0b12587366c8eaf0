//! Process-wide serving status registry.
//!
//! [`HealthRegistry`] owns the map from service name to
//! [`ServingStatus`]. It is created once by the server lifecycle and handed
//! by clone to anything that needs to read or change a status. Every change
//! is mirrored into a [`HealthReporter`] so the standard
//! `grpc.health.v1.Health` service answers probes from the same state.

use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tonic_health::server::HealthReporter;

pub use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_server::{Health, HealthServer};

/// Thread-safe map of service name to serving status.
///
/// Querying a name returns the most recently set status, or
/// [`ServingStatus::ServiceUnknown`] if the name was never set. Setting a
/// status never fails and adds unknown names as new entries.
#[derive(Clone)]
pub struct HealthRegistry {
    statuses: Arc<RwLock<HashMap<String, ServingStatus>>>,
    reporter: HealthReporter,
}

impl HealthRegistry {
    /// Creates an empty registry together with the gRPC health service that
    /// publishes its statuses.
    ///
    /// The returned service is meant to be registered exactly once in the
    /// server's dispatch table.
    pub fn new() -> (Self, HealthServer<impl Health>) {
        let (reporter, service) = tonic_health::server::health_reporter();
        let registry = Self {
            statuses: Arc::new(RwLock::new(HashMap::new())),
            reporter,
        };
        (registry, service)
    }

    /// Records `status` for `service_name` and publishes it to health probes.
    pub async fn set_serving_status(&self, service_name: &str, status: ServingStatus) {
        self.statuses
            .write()
            .insert(service_name.to_string(), status);

        tracing::info!(service = %service_name, status = ?status, "Serving status updated");

        self.reporter
            .set_service_status(service_name, to_reported(status))
            .await;
    }

    /// Returns the current status of `service_name`.
    pub fn check(&self, service_name: &str) -> ServingStatus {
        self.statuses
            .read()
            .get(service_name)
            .copied()
            .unwrap_or(ServingStatus::ServiceUnknown)
    }
}

/// The health reporter only knows the three states a probe can be told about
/// a registered service.
fn to_reported(status: ServingStatus) -> tonic_health::ServingStatus {
    match status {
        ServingStatus::Serving => tonic_health::ServingStatus::Serving,
        ServingStatus::NotServing => tonic_health::ServingStatus::NotServing,
        ServingStatus::Unknown | ServingStatus::ServiceUnknown => {
            tonic_health::ServingStatus::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_set_names_are_service_unknown() {
        let (registry, _service) = HealthRegistry::new();
        assert_eq!(registry.check("users.Users"), ServingStatus::ServiceUnknown);
        assert_eq!(registry.check(""), ServingStatus::ServiceUnknown);
    }

    #[tokio::test]
    async fn latest_status_wins() {
        let (registry, _service) = HealthRegistry::new();

        registry
            .set_serving_status("X", ServingStatus::Serving)
            .await;
        assert_eq!(registry.check("X"), ServingStatus::Serving);

        registry
            .set_serving_status("X", ServingStatus::NotServing)
            .await;
        assert_eq!(registry.check("X"), ServingStatus::NotServing);
        assert_eq!(registry.check("Y"), ServingStatus::ServiceUnknown);
    }

    #[tokio::test]
    async fn clones_share_the_same_map() {
        let (registry, _service) = HealthRegistry::new();
        let other = registry.clone();

        other.set_serving_status("X", ServingStatus::Unknown).await;
        assert_eq!(registry.check("X"), ServingStatus::Unknown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_writers_and_readers() {
        let (registry, _service) = HealthRegistry::new();
        let mut tasks = Vec::new();

        for i in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let name = format!("svc-{i}");
                let status = if i % 2 == 0 {
                    ServingStatus::Serving
                } else {
                    ServingStatus::NotServing
                };
                registry.set_serving_status(&name, status).await;
                assert_eq!(registry.check(&name), status);
            }));
        }

        for task in tasks {
            task.await.expect("task panicked");
        }

        for i in 0..32 {
            let expected = if i % 2 == 0 {
                ServingStatus::Serving
            } else {
                ServingStatus::NotServing
            };
            assert_eq!(registry.check(&format!("svc-{i}")), expected);
        }
    }

    #[test]
    fn reported_status_collapses_unknowns() {
        assert_eq!(
            to_reported(ServingStatus::ServiceUnknown),
            tonic_health::ServingStatus::Unknown
        );
        assert_eq!(
            to_reported(ServingStatus::Serving),
            tonic_health::ServingStatus::Serving
        );
    }
}
