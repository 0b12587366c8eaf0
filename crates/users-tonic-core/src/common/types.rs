//! # Constants for synthesized users
//!
//! No user data is stored anywhere. Every [`User`](crate::proto::User) is
//! derived from the lookup request at call time, and the values here fill in
//! what the request cannot supply.

/// Separator between the local part and the domain of an email address.
pub const EMAIL_SEPARATOR: char = '@';

/// Age reported for every synthesized user.
pub const DEFAULT_AGE: i32 = 36;
