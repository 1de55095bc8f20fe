//! Middleware Module
//!
//! Request processing that runs before handlers.
//!
//! - **`auth`** - the `Identity` extractor (JWT bearer, `access_token`
//!   query parameter, or the development `X-User-Id` header)

pub mod auth;

pub use auth::{identify, issue_token, verify_token, Claims, Identity, DEV_USER_HEADER};
