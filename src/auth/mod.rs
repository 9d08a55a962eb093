//! Authentication of the acting user.
//!
//! Every mutating route requires an `X-API-Key` header resolving to a
//! [`User`](crate::models::User). Registry access tokens are linked to users
//! out of band and never travel through this header.

mod extractor;

pub use extractor::{AuthError, AuthenticatedUser};
