//! Shared authentication primitives for the post platform.
//!
//! - `jwt`: RS256 token issuance and validation with explicitly constructed keys
//! - `session`: classification of a stored bearer token at startup or per request

pub mod jwt;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use jwt::{Claims, JwtKeys, TokenSubject};
pub use session::{restore_session, SessionState};
