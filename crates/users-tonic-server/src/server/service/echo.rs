//! `GetHelp`: the receive/echo/send loop of a single help session.

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tonic::Status;
use users_tonic_core::{
    Error,
    proto::{UserHelpReply, UserHelpRequest},
};

/// Runs one `GetHelp` session to completion.
///
/// Each request read from `inbound` is answered with exactly one reply whose
/// `response` equals the request, sent on `outbound` before the next request
/// is read. The session ends successfully when the client half-closes the
/// stream and returns the number of replies sent.
///
/// A receive failure is forwarded to the client as the terminal status (best
/// effort, the client may already be gone) and returned as
/// [`Error::StreamIo`]. If the outbound half is closed the session stops with
/// [`Error::ChannelError`].
pub async fn echo_help<S>(
    mut inbound: S,
    outbound: mpsc::Sender<Result<UserHelpReply, Status>>,
) -> users_tonic_core::Result<u64>
where
    S: Stream<Item = Result<UserHelpRequest, Status>> + Unpin,
{
    let mut echoed = 0;

    while let Some(next) = inbound.next().await {
        let request = match next {
            Ok(request) => request,
            Err(status) => {
                if let Err(e) = outbound.send(Err(status.clone())).await {
                    tracing::debug!("Failed to forward stream error: {e}");
                }
                return Err(Error::StreamIo(status));
            }
        };

        tracing::info!(request = %request.request, "Help request received");

        let reply = UserHelpReply {
            response: request.request,
        };
        if let Err(e) = outbound.send(Ok(reply)).await {
            return Err(Error::ChannelError {
                context: format!("Failed to forward reply: {e}"),
            });
        }
        echoed += 1;
    }

    Ok(echoed)
}
