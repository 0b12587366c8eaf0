//! gRPC service implementation for the `users.Users` service.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`UserService`).
//! - [`lookup`] - Synthesizes a user from a `GetUser` request.
//! - [`echo`] - The receive/send loop behind one `GetHelp` session.

pub mod echo;
pub mod handler;
pub mod lookup;
