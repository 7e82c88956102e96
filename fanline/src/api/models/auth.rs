//! API request/response models for authentication.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{creators::CreatorProfileResponse, users::UserResponse};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatorLoginRequest {
    pub slug: String,
    pub password: String,
}

/// Body returned after a successful user login or registration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// Session token, also set as an HTTP-only cookie. Usable as a `Bearer` token.
    pub token: String,
    pub message: String,
}

/// Body returned after a successful creator login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatorAuthResponse {
    pub creator: CreatorProfileResponse,
    /// Session token, also set as an HTTP-only cookie. Usable as a `Bearer` token.
    pub token: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// A JSON body plus the `Set-Cookie` header carrying (or clearing) the session.
#[derive(Debug)]
pub struct SessionResponse<T> {
    pub status: StatusCode,
    pub body: T,
    pub cookie: String,
}

impl<T: Serialize> IntoResponse for SessionResponse<T> {
    fn into_response(self) -> Response {
        (self.status, [(header::SET_COOKIE, self.cookie)], Json(self.body)).into_response()
    }
}
