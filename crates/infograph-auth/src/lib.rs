//! Authentication and session ownership for Infograph.
//!
//! [`AuthService`] bridges an external identity assertion to a local
//! [`User`](infograph_core::user::User) and a signed session token;
//! [`authorize_session_access`] is the ownership check every session-scoped
//! operation runs before touching a session or anything nested under it.

pub mod claims;
pub mod config;
pub mod error;
pub mod guard;
pub mod service;
pub mod verifier;

pub use claims::Claims;
pub use config::AuthConfig;
pub use error::{AccessError, AuthError};
pub use guard::authorize_session_access;
pub use service::AuthService;
pub use verifier::{GoogleVerifier, IdentityClaims, IdentityVerifier, VerifyError};
