//! Error types for the users service.
//!
//! This module defines the central `Error` enum for everything a request
//! handler can fail with. It implements `From<Error>` for `tonic::Status` so
//! handlers can return it to the calling peer with the appropriate status
//! code.
//!
//! ## Error Cases
//! - `InvalidEmail`: The lookup email did not split into exactly two parts.
//! - `StreamIo`: Receiving from an open `GetHelp` stream failed.
//! - `ChannelError`: The outbound half of a `GetHelp` stream was closed while
//!   a reply was being sent.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the users service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// The email address is not of the form `local@domain`.
    #[error("invalid email address")]
    InvalidEmail { email: String },

    /// Reading the next message from the client stream failed.
    #[error("Stream error: {0}")]
    StreamIo(Status),

    /// The reply could not be handed to the outbound stream.
    #[error("Channel error: {context}")]
    ChannelError { context: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidEmail { .. } => Status::invalid_argument("invalid email address"),
            Error::StreamIo(status) => status,
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn invalid_email_maps_to_invalid_argument() {
        let status = Status::from(Error::InvalidEmail {
            email: "nodomain".to_string(),
        });
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "invalid email address");
    }

    #[test]
    fn stream_errors_keep_the_peer_status() {
        let status = Status::from(Error::StreamIo(Status::cancelled("client went away")));
        assert_eq!(status.code(), Code::Cancelled);
        assert_eq!(status.message(), "client went away");
    }

    #[test]
    fn channel_errors_are_internal() {
        let status = Status::from(Error::ChannelError {
            context: "closed".to_string(),
        });
        assert_eq!(status.code(), Code::Internal);
    }
}
