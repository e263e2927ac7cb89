//! Session restoration from a stored bearer token.
//!
//! A client that persisted a token calls [`restore_session`] once when it
//! starts, and API middleware calls it per request. Both get the same three-way
//! answer: the token is good, it was genuine but has expired (log the user
//! out), or it must be discarded.

use crate::jwt::{Claims, JwtKeys, ACCESS_TOKEN_TYPE};
use jsonwebtoken::errors::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Signature and expiry both check out.
    Authenticated(Claims),
    /// Signature is valid but `exp` is in the past.
    Expired(Claims),
    /// Malformed, tampered, signed with a different key, or not an access token.
    Invalid(String),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Classify `token` against `keys`.
///
/// Only access tokens restore a session; a refresh token signed with the same
/// key is `Invalid` whether or not it has expired.
pub fn restore_session(keys: &JwtKeys, token: &str) -> SessionState {
    match keys.decode_claims(token, true) {
        Ok(data) => match require_access(data.claims) {
            Ok(claims) => SessionState::Authenticated(claims),
            Err(state) => state,
        },
        Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
            match keys.decode_claims(token, false) {
                Ok(data) => match require_access(data.claims) {
                    Ok(claims) => {
                        tracing::debug!(sub = %claims.sub, "stored session has expired");
                        SessionState::Expired(claims)
                    }
                    Err(state) => state,
                },
                Err(err) => SessionState::Invalid(err.to_string()),
            }
        }
        Err(err) => SessionState::Invalid(err.to_string()),
    }
}

fn require_access(claims: Claims) -> Result<Claims, SessionState> {
    if claims.token_type == ACCESS_TOKEN_TYPE {
        Ok(claims)
    } else {
        tracing::debug!(sub = %claims.sub, token_type = %claims.token_type, "non-access token presented");
        Err(SessionState::Invalid(format!(
            "unexpected token type '{}'",
            claims.token_type
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::TokenSubject;
    use crate::testing::{signed_token, signing_keys};
    use chrono::Duration;
    use uuid::Uuid;

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            name: "Grace".to_string(),
            avatar: String::new(),
        }
    }

    #[test]
    fn fresh_token_restores_authenticated_session() {
        let keys = signing_keys();
        let token = keys.generate_access_token(&subject()).unwrap();

        let state = restore_session(&keys, &token);
        assert!(state.is_authenticated());
    }

    #[test]
    fn expired_token_keeps_its_claims() {
        let keys = signing_keys();
        let subject = subject();
        let token = keys
            .generate_token_with_ttl(&subject, Duration::hours(-1))
            .unwrap();

        match restore_session(&keys, &token) {
            SessionState::Expired(claims) => {
                assert_eq!(claims.sub, subject.user_id.to_string());
                assert_eq!(claims.name, "Grace");
            }
            other => panic!("expected expired session, got {other:?}"),
        }
    }

    #[test]
    fn refresh_token_is_rejected() {
        let keys = signing_keys();
        let now = chrono::Utc::now().timestamp();
        let mut claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 3600,
            token_type: "refresh".to_string(),
            name: "Grace".to_string(),
            avatar: String::new(),
        };

        let token = signed_token(&claims);
        match restore_session(&keys, &token) {
            SessionState::Invalid(reason) => assert!(reason.contains("refresh")),
            other => panic!("expected invalid session, got {other:?}"),
        }

        claims.exp = now - 3600;
        let expired = signed_token(&claims);
        assert!(matches!(
            restore_session(&keys, &expired),
            SessionState::Invalid(_)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let keys = signing_keys();
        assert!(matches!(
            restore_session(&keys, "abc.def.ghi"),
            SessionState::Invalid(_)
        ));
    }
}
