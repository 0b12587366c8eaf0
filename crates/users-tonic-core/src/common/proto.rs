//! gRPC service and message definitions generated from `proto/users.proto`.
//!
//! ## Service
//!
//! - `GetUser` - unary lookup that synthesizes a [`User`] from the request.
//! - `GetHelp` - bidirectional stream that echoes each [`UserHelpRequest`] as
//!   a [`UserHelpReply`].
//!
//! The encoded [`FILE_DESCRIPTOR_SET`] is emitted by the build script and is
//! what the server registers with gRPC reflection.

tonic::include_proto!("users");

/// Encoded `FileDescriptorSet` for `users.proto`.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("users_descriptor");
