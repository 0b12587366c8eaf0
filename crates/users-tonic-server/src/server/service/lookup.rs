//! `GetUser`: builds a user out of the lookup request alone.

use users_tonic_core::{
    Error, Result,
    proto::{User, UserGetRequest},
    types::{DEFAULT_AGE, EMAIL_SEPARATOR},
};

/// Synthesizes a [`User`] from a lookup request.
///
/// The email must split on `@` into exactly two parts: the part before the
/// separator becomes the first name and the part after it the last name.
/// Empty parts are accepted.
pub fn lookup_user(request: &UserGetRequest) -> Result<User> {
    let (first_name, last_name) = request
        .email
        .split_once(EMAIL_SEPARATOR)
        .filter(|(_, domain)| !domain.contains(EMAIL_SEPARATOR))
        .ok_or_else(|| Error::InvalidEmail {
            email: request.email.clone(),
        })?;

    Ok(User {
        id: request.id.clone(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        age: DEFAULT_AGE,
    })
}
