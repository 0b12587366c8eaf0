//! gRPC service implementation for user lookups and streaming help.
//!
//! This module defines [`UserService`], the concrete implementation of the
//! [`Users`] gRPC service defined in the protobuf specification. The service
//! keeps no state between calls: lookups are synthesized from the request and
//! every help session runs as its own task.

use crate::server::{
    config::ServerConfig,
    service::{echo::echo_help, lookup::lookup_user},
    telemetry::{
        decrement_help_sessions_inflight, increment_help_messages, increment_help_sessions_inflight,
        increment_invalid_lookups, increment_user_lookups, record_help_session_duration,
    },
};
use core::pin::Pin;
use futures::TryStreamExt;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};
use tracing::Instrument;
use users_tonic_core::proto::{
    UserGetReply, UserGetRequest, UserHelpReply, UserHelpRequest, users_server::Users,
};

/// Stateless implementation of the `users.Users` service.
#[derive(Clone, Debug)]
pub struct UserService {
    stream_buffer_size: usize,
}

impl UserService {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            stream_buffer_size: config.stream_buffer_size,
        }
    }
}

impl Default for UserService {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

#[tonic::async_trait]
impl Users for UserService {
    type GetHelpStream = Pin<Box<dyn Stream<Item = Result<UserHelpReply, Status>> + Send>>;

    /// Synthesizes a user from the id and email in the request.
    ///
    /// Fails with `INVALID_ARGUMENT` unless the email holds exactly one `@`.
    #[tracing::instrument(skip_all)]
    async fn get_user(
        &self,
        req: Request<UserGetRequest>,
    ) -> Result<Response<UserGetReply>, Status> {
        let req = req.into_inner();
        tracing::info!(email = %req.email, id = %req.id, "Received request for user");
        increment_user_lookups();

        match lookup_user(&req) {
            Ok(user) => Ok(Response::new(UserGetReply { user: Some(user) })),
            Err(e) => {
                increment_invalid_lookups();
                tracing::warn!(email = %req.email, "Rejected lookup: {e}");
                Err(e.into())
            }
        }
    }

    /// Echoes every help request back to the client, in order.
    ///
    /// The session is driven by a spawned task so that sessions stay
    /// independent of each other. It ends when the client half-closes its
    /// side, or with the first receive or send error.
    #[tracing::instrument(skip_all)]
    async fn get_help(
        &self,
        req: Request<Streaming<UserHelpRequest>>,
    ) -> Result<Response<Self::GetHelpStream>, Status> {
        let inbound = req.into_inner();
        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<UserHelpReply, Status>>(self.stream_buffer_size);

        increment_help_sessions_inflight();
        let start = std::time::Instant::now();

        let session = async move {
            match echo_help(inbound, resp_tx).await {
                Ok(echoed) => {
                    tracing::debug!(echoed, "Help session closed by client");
                }
                Err(e) => {
                    tracing::warn!("Help session aborted: {e}");
                }
            }
            decrement_help_sessions_inflight();
            record_help_session_duration(start.elapsed().as_millis() as f64);
        };
        tokio::spawn(session.instrument(tracing::info_span!("help_session")));

        let stream = ReceiverStream::new(resp_rx).inspect_ok(|_| increment_help_messages());

        Ok(Response::new(Box::pin(stream)))
    }
}
