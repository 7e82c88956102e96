use axum::{extract::State, http::StatusCode, Json};

use crate::{
    AppState,
    api::{
        extract::JsonBody,
        models::{
            auth::{
                AuthResponse, AuthSuccessResponse, CreatorAuthResponse, CreatorLoginRequest, LoginRequest, RegisterRequest,
                SessionResponse,
            },
            users::{CurrentUser, UserResponse},
        },
    },
    auth::{
        password::{self, Argon2Params},
        session::{self, PrincipalKind},
    },
    config::Config,
    db::{
        handlers::{Creators, Users, repository::Repository},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    types::normalize_email,
};

/// `Set-Cookie` value carrying a fresh session token
pub(crate) fn session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.session;
    let max_age = config.auth.security.jwt_expiry.as_secs();
    let secure = if session.cookie_secure { "; Secure" } else { "" };
    format!(
        "{}={token}; Path=/; HttpOnly{secure}; SameSite={}; Max-Age={max_age}",
        session.cookie_name, session.cookie_same_site
    )
}

/// `Set-Cookie` value that makes the browser drop the session
fn expired_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        config.auth.session.cookie_name
    )
}

fn invalid_credentials(what: &str) -> Error {
    Error::Unauthenticated {
        message: Some(format!("Invalid {what} or password")),
    }
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or registration disabled"),
        (status = 409, description = "An account with this email already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<SessionResponse<AuthResponse>, Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let email = normalize_email(&request.email);
    if email.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    password::validate_length(&request.password, &state.config.auth.password)?;

    let params = Argon2Params::from(&state.config.auth.password);
    let password_hash = password::hash_blocking(request.password, params).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email,
            name: request.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Registered user");

    let token = session::create_session_token(user.id, PrincipalKind::User, &state.config)?;
    Ok(SessionResponse {
        status: StatusCode::CREATED,
        cookie: session_cookie(&token, &state.config),
        body: AuthResponse {
            user: UserResponse::from(user),
            token,
            message: "Registration successful".to_string(),
        },
    })
}

/// Log in as a user
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account is disabled"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<SessionResponse<AuthResponse>, Error> {
    let email = normalize_email(&request.email);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    let user = users.get_user_by_email(&email).await?.ok_or_else(|| invalid_credentials("email"))?;

    if !user.is_active {
        return Err(Error::Forbidden {
            message: "Account is disabled".to_string(),
        });
    }
    if !password::verify_blocking(request.password, user.password_hash.clone()).await? {
        return Err(invalid_credentials("email"));
    }

    let user = users.record_login(user.id).await?;
    let token = session::create_session_token(user.id, PrincipalKind::User, &state.config)?;

    Ok(SessionResponse {
        status: StatusCode::OK,
        cookie: session_cookie(&token, &state.config),
        body: AuthResponse {
            user: UserResponse::from(user),
            token,
            message: "Login successful".to_string(),
        },
    })
}

/// Log in as a creator
#[utoipa::path(
    post,
    path = "/creators/login",
    request_body = CreatorLoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = CreatorAuthResponse),
        (status = 401, description = "Invalid slug or password"),
        (status = 403, description = "Account is disabled"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_creator(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreatorLoginRequest>,
) -> Result<SessionResponse<CreatorAuthResponse>, Error> {
    let slug = request.slug.trim().to_lowercase();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let creator = Creators::new(&mut conn)
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| invalid_credentials("slug"))?;

    if !creator.is_active {
        return Err(Error::Forbidden {
            message: "Account is disabled".to_string(),
        });
    }
    // Accounts onboarded without a credential cannot log in
    let stored = creator.password.clone().ok_or_else(|| invalid_credentials("slug"))?;
    if !password::verify_blocking(request.password, stored).await? {
        return Err(invalid_credentials("slug"));
    }

    let token = session::create_session_token(creator.id, PrincipalKind::Creator, &state.config)?;
    Ok(SessionResponse {
        status: StatusCode::OK,
        cookie: session_cookie(&token, &state.config),
        body: CreatorAuthResponse {
            creator: creator.into(),
            token,
            message: "Login successful".to_string(),
        },
    })
}

/// Log out (user or creator)
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<SessionResponse<AuthSuccessResponse>, Error> {
    Ok(SessionResponse {
        status: StatusCode::OK,
        cookie: expired_cookie(&state.config),
        body: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
    })
}

/// The logged-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(current_user: CurrentUser) -> Result<Json<CurrentUser>, Error> {
    Ok(Json(current_user))
}
