//! JWT session tokens.
//!
//! Users and creators log in separately. A token names which kind of account it belongs to, so a
//! creator session is never accepted on a user route or the other way round.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, errors::Error};

/// Which table the session subject lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Creator,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User or creator id
    pub sub: Uuid,
    pub kind: PrincipalKind,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn new(sub: Uuid, kind: PrincipalKind, config: &Config) -> Self {
        let issued = Utc::now();
        Self {
            sub,
            kind,
            exp: (issued + config.auth.security.jwt_expiry).timestamp(),
            iat: issued.timestamp(),
        }
    }
}

fn signing_secret(config: &Config) -> Result<&[u8], Error> {
    config
        .secret_key
        .as_deref()
        .map(str::as_bytes)
        .ok_or_else(|| Error::Internal {
            operation: "JWT sessions: secret_key is required".to_string(),
        })
}

/// Failures caused by the token itself rather than by our keys.
fn is_bad_token(kind: &ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::ExpiredSignature
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
    )
}

pub fn create_session_token(sub: Uuid, kind: PrincipalKind, config: &Config) -> Result<String, Error> {
    let key = EncodingKey::from_secret(signing_secret(config)?);

    encode(&Header::default(), &SessionClaims::new(sub, kind, config), &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Decode a session token. Expired, tampered or garbled tokens give `Unauthenticated`; key
/// problems give `Internal`.
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(signing_secret(config)?);

    decode::<SessionClaims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            if is_bad_token(e.kind()) {
                Error::Unauthenticated { message: None }
            } else {
                Error::Internal {
                    operation: format!("JWT verification: {e}"),
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config {
            secret_key: Some("session-test-secret".to_string()),
            ..Default::default()
        };
        config.auth.security.jwt_expiry = Duration::from_secs(3600);
        config
    }

    fn sign<T: Serialize>(claims: &T, config: &Config) -> String {
        let key = EncodingKey::from_secret(config.secret_key.as_deref().unwrap().as_bytes());
        encode(&Header::default(), claims, &key).unwrap()
    }

    #[test]
    fn test_token_carries_subject_and_kind() {
        let config = config();
        let id = Uuid::new_v4();

        let token = create_session_token(id, PrincipalKind::Creator, &config).unwrap();
        let claims = verify_session_token(&token, &config).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.kind, PrincipalKind::Creator);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejected_tokens_are_unauthenticated() {
        let config = config();
        let now = Utc::now().timestamp();

        let expired = sign(
            &SessionClaims {
                sub: Uuid::new_v4(),
                kind: PrincipalKind::User,
                exp: now - 3600,
                iat: now - 7200,
            },
            &config,
        );
        let no_kind = sign(&serde_json::json!({"sub": Uuid::new_v4(), "exp": now + 60, "iat": now}), &config);
        let mut other_secret = config.clone();
        other_secret.secret_key = Some("someone-else".to_string());
        let foreign = create_session_token(Uuid::new_v4(), PrincipalKind::User, &other_secret).unwrap();

        for token in [expired.as_str(), no_kind.as_str(), foreign.as_str(), "not.a.token", ""] {
            assert!(
                matches!(verify_session_token(token, &config), Err(Error::Unauthenticated { .. })),
                "token should be rejected: {token:?}"
            );
        }
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let config = Config::default();
        assert!(matches!(
            create_session_token(Uuid::new_v4(), PrincipalKind::User, &config),
            Err(Error::Internal { .. })
        ));
    }
}
