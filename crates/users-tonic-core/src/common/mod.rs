//! Shared protocol bindings, constants and errors for the users service.
//!
//! ## Submodules
//!
//! - [`error`] - Service error type and its mapping onto [`tonic::Status`].
//! - [`proto`] - Generated Protobuf messages, client and server for `users`.
//! - [`types`] - Constants that shape synthesized users.

pub mod error;
pub mod proto;
pub mod types;

pub use error::{Error, Result};
