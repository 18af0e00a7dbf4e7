//! HTTP-facing glue for the identity core: bearer authentication, the
//! authenticated-caller extractor and error-to-response mapping. Routing
//! lives with the embedding application.

pub mod auth;
mod error;

pub use auth::{Principal, bearer_auth, require_role};
pub use error::ApiError;
