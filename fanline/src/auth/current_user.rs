use crate::{
    AppState,
    api::models::{creators::CurrentCreator, users::CurrentUser},
    auth::{
        password::constant_time_eq,
        session::{self, PrincipalKind},
    },
    config::Config,
    db::handlers::{Creators, Repository, Users},
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use tracing::{instrument, trace};
use uuid::Uuid;

/// Header carrying the admin password on admin routes
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Find the session token, preferring the session cookie over a bearer token.
fn session_token(parts: &Parts, config: &Config) -> Option<String> {
    let cookie_name = &config.auth.session.cookie_name;

    let from_cookie = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name.as_str() && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Verify the request's session and return the principal id, which must be of `expected` kind.
fn authenticate(parts: &Parts, config: &Config, expected: PrincipalKind) -> Result<Uuid> {
    let token = session_token(parts, config).ok_or(Error::Unauthenticated { message: None })?;
    let claims = session::verify_session_token(&token, config)?;

    if claims.kind != expected {
        trace!(kind = ?claims.kind, ?expected, "Session belongs to the wrong kind of account");
        let message = match expected {
            PrincipalKind::User => "This endpoint requires a user session",
            PrincipalKind::Creator => "This endpoint requires a creator session",
        };
        return Err(Error::Forbidden {
            message: message.to_string(),
        });
    }

    Ok(claims.sub)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user_id = authenticate(parts, &state.config, PrincipalKind::User)?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let user = Users::new(&mut conn)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("Account no longer exists".to_string()),
            })?;

        if !user.is_active {
            return Err(Error::Forbidden {
                message: "Account is disabled".to_string(),
            });
        }

        Ok(user.into())
    }
}

/// `Option<CurrentUser>` resolves to `None` for anonymous callers and for sessions that do not
/// check out, so public routes never fail on a stale cookie.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(Error::Unauthenticated { .. } | Error::Forbidden { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl FromRequestParts<AppState> for CurrentCreator {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let creator_id = authenticate(parts, &state.config, PrincipalKind::Creator)?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let creator = Creators::new(&mut conn)
            .get_by_id(creator_id)
            .await?
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("Account no longer exists".to_string()),
            })?;

        if !creator.is_active {
            return Err(Error::Forbidden {
                message: "Account is disabled".to_string(),
            });
        }

        Ok(creator.into())
    }
}

/// Proof that the request carried the admin password.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(expected) = state.config.admin_password.as_deref() else {
            return Err(Error::Forbidden {
                message: "Admin access is not configured".to_string(),
            });
        };

        let provided = parts
            .headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("Admin password required".to_string()),
            })?;

        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            return Err(Error::Unauthenticated {
                message: Some("Invalid admin password".to_string()),
            });
        }

        Ok(AdminAccess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_app_state, create_test_creator, create_test_user};
    use axum::http::Request;
    use sqlx::PgPool;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("http://localhost/test");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_session_token_prefers_cookie() {
        let config = crate::test::utils::create_test_config();
        let cookie = format!("other=1; {}=from-cookie", config.auth.session.cookie_name);
        let parts = parts_with_headers(&[("cookie", &cookie), ("authorization", "Bearer from-header")]);
        assert_eq!(session_token(&parts, &config).as_deref(), Some("from-cookie"));

        let parts = parts_with_headers(&[("authorization", "Bearer from-header")]);
        assert_eq!(session_token(&parts, &config).as_deref(), Some("from-header"));

        let parts = parts_with_headers(&[("authorization", "Basic abc")]);
        assert!(session_token(&parts, &config).is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_current_user_from_bearer_token(pool: PgPool) {
        let state = create_test_app_state(pool.clone());
        let user = create_test_user(&pool, "fan@example.com").await;
        let token = session::create_session_token(user.id, PrincipalKind::User, &state.config).unwrap();

        let mut parts = parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);
        let current = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(current.id, user.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_creator_session_rejected_on_user_extractor(pool: PgPool) {
        let state = create_test_app_state(pool.clone());
        let creator = create_test_creator(&pool, "luna").await;
        let token = session::create_session_token(creator.id, PrincipalKind::Creator, &state.config).unwrap();

        let mut parts = parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        let mut parts = parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);
        let current = CurrentCreator::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.slug, "luna");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_optional_user_ignores_bad_tokens(pool: PgPool) {
        let state = create_test_app_state(pool);

        let mut parts = parts_with_headers(&[("authorization", "Bearer not-a-jwt")]);
        let viewer = <CurrentUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(viewer.is_none());

        let mut parts = parts_with_headers(&[]);
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_access(pool: PgPool) {
        let mut state = create_test_app_state(pool);

        state.config.admin_password = None;
        let mut parts = parts_with_headers(&[(ADMIN_PASSWORD_HEADER, "anything")]);
        let err = AdminAccess::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        state.config.admin_password = Some("s3cret".to_string());
        let mut parts = parts_with_headers(&[]);
        let err = AdminAccess::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let mut parts = parts_with_headers(&[(ADMIN_PASSWORD_HEADER, "wrong")]);
        let err = AdminAccess::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let mut parts = parts_with_headers(&[(ADMIN_PASSWORD_HEADER, "s3cret")]);
        assert!(AdminAccess::from_request_parts(&mut parts, &state).await.is_ok());
    }
}
