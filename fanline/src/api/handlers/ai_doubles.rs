use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::{
        extract::{JsonBody, PathParams},
        handlers::required_text,
        models::{
            ai_doubles::{AiDoubleCreate, AiDoubleResponse, AiDoubleStatus, AiDoubleUpdate, SharedAiDoubleResponse},
            users::CurrentUser,
        },
    },
    auth::password::generate_suffix,
    db::{
        errors::DbError,
        handlers::{AiDoubles, ai_doubles::AiDoubleFilter, repository::Repository},
        models::ai_doubles::{AiDoubleCreateDBRequest, AiDoubleDBResponse, AiDoubleUpdateDBRequest},
    },
    errors::Error,
    types::{AiDoubleId, UserId, slugify},
};

const SHARE_SUFFIX_LEN: usize = 6;
const MAX_SLUG_ATTEMPTS: usize = 5;

/// Share link for a double: its slugified name plus a random suffix.
fn share_slug_for(name: &str) -> String {
    let base = slugify(name);
    let base = if base.is_empty() { "double".to_string() } else { base };
    format!("{base}-{}", generate_suffix(SHARE_SUFFIX_LEN))
}

async fn owned_double(conn: &mut PgConnection, id: AiDoubleId, user_id: UserId) -> Result<AiDoubleDBResponse, Error> {
    AiDoubles::new(conn)
        .get_by_id(id)
        .await?
        .filter(|d| d.user_id == user_id)
        .ok_or_else(|| Error::NotFound {
            resource: "AI double".to_string(),
            id: id.to_string(),
        })
}

/// Create a voice/persona profile
#[utoipa::path(
    post,
    path = "/ai-doubles",
    tag = "ai-doubles",
    request_body = AiDoubleCreate,
    responses(
        (status = 201, description = "AI double created", body = AiDoubleResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "No free share link after several attempts"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn create_ai_double(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(request): JsonBody<AiDoubleCreate>,
) -> Result<(StatusCode, Json<AiDoubleResponse>), Error> {
    let name = required_text(&request.name, "name")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = AiDoubles::new(&mut conn);

    let mut attempt = 0;
    let created = loop {
        attempt += 1;
        let create = AiDoubleCreateDBRequest {
            user_id: current_user.id,
            name: name.clone(),
            system_prompt: request.system_prompt.clone(),
            share_slug: share_slug_for(&name),
        };
        match repo.create(&create).await {
            Ok(created) => break created,
            Err(DbError::UniqueViolation { .. }) if attempt < MAX_SLUG_ATTEMPTS => {
                tracing::debug!(attempt, "Share slug collision, retrying");
            }
            Err(DbError::UniqueViolation { .. }) => {
                return Err(Error::Conflict {
                    message: "Could not allocate a unique share link, please retry".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    };

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// The logged-in user's AI doubles
#[utoipa::path(
    get,
    path = "/ai-doubles",
    tag = "ai-doubles",
    responses(
        (status = 200, description = "AI doubles, newest first", body = [AiDoubleResponse]),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn list_ai_doubles(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<AiDoubleResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let doubles = AiDoubles::new(&mut conn)
        .list(&AiDoubleFilter {
            skip: 0,
            limit: i64::MAX,
            user_id: Some(current_user.id),
            status: None,
        })
        .await?;

    Ok(Json(doubles.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/ai-doubles/{id}",
    tag = "ai-doubles",
    params(("id" = String, Path, description = "AI double ID")),
    responses(
        (status = 200, description = "AI double", body = AiDoubleResponse),
        (status = 404, description = "AI double not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, ai_double_id = %id))]
pub async fn get_ai_double(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParams(id): PathParams<AiDoubleId>,
) -> Result<Json<AiDoubleResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let double = owned_double(&mut conn, id, current_user.id).await?;

    Ok(Json(double.into()))
}

/// Update an AI double. Marking it `completed` requires a voice.
#[utoipa::path(
    patch,
    path = "/ai-doubles/{id}",
    tag = "ai-doubles",
    params(("id" = String, Path, description = "AI double ID")),
    request_body = AiDoubleUpdate,
    responses(
        (status = 200, description = "AI double updated", body = AiDoubleResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "AI double not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, ai_double_id = %id))]
pub async fn update_ai_double(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParams(id): PathParams<AiDoubleId>,
    JsonBody(request): JsonBody<AiDoubleUpdate>,
) -> Result<Json<AiDoubleResponse>, Error> {
    let mut update = AiDoubleUpdateDBRequest::from(request);
    if let Some(name) = update.name.as_deref() {
        update.name = Some(required_text(name, "name")?);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let existing = owned_double(&mut conn, id, current_user.id).await?;

    if update.status == Some(AiDoubleStatus::Completed) {
        let has_voice = update
            .voice_id
            .as_deref()
            .or(existing.voice_id.as_deref())
            .is_some_and(|v| !v.trim().is_empty());
        if !has_voice {
            return Err(Error::BadRequest {
                message: "A voice_id is required before an AI double can be completed".to_string(),
            });
        }
    }

    let updated = AiDoubles::new(&mut conn).update(id, &update).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/ai-doubles/{id}",
    tag = "ai-doubles",
    params(("id" = String, Path, description = "AI double ID")),
    responses(
        (status = 204, description = "AI double deleted"),
        (status = 404, description = "AI double not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, ai_double_id = %id))]
pub async fn delete_ai_double(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParams(id): PathParams<AiDoubleId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_double(&mut conn, id, current_user.id).await?;
    AiDoubles::new(&mut conn).delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Public view of a shared AI double. Only public, completed doubles are visible.
#[utoipa::path(
    get,
    path = "/ai-doubles/shared/{share_slug}",
    tag = "ai-doubles",
    params(("share_slug" = String, Path, description = "Share slug")),
    responses(
        (status = 200, description = "Shared AI double", body = SharedAiDoubleResponse),
        (status = 404, description = "Not found, not public, or not completed"),
    )
)]
#[tracing::instrument(skip_all, fields(share_slug = %share_slug))]
pub async fn get_shared_ai_double(
    State(state): State<AppState>,
    PathParams(share_slug): PathParams<String>,
) -> Result<Json<SharedAiDoubleResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let double = AiDoubles::new(&mut conn)
        .get_by_share_slug(&share_slug)
        .await?
        .filter(|d| d.is_public && d.status == AiDoubleStatus::Completed)
        .ok_or_else(|| Error::NotFound {
            resource: "AI double".to_string(),
            id: share_slug.clone(),
        })?;

    Ok(Json(double.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_server, create_test_user, user_token};
    use serde_json::json;
    use sqlx::PgPool;

    #[test]
    fn test_share_slug_for() {
        let slug = share_slug_for("My Voice!");
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "my-voice");
        assert_eq!(suffix.len(), SHARE_SUFFIX_LEN);

        assert!(share_slug_for("???").starts_with("double-"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_complete(pool: PgPool) {
        let owner = create_test_user(&pool, "owner@example.com").await;
        let server = create_test_server(pool).await;
        let token = user_token(owner.id);

        let response = server
            .post("/api/ai-doubles")
            .authorization_bearer(&token)
            .json(&json!({"name": "Late Night Me"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: AiDoubleResponse = response.json();
        assert_eq!(created.status, AiDoubleStatus::Pending);
        assert!(created.share_slug.starts_with("late-night-me-"));
        assert!(created.completed_at.is_none());

        let path = format!("/api/ai-doubles/{}", created.id);

        // No voice yet
        server
            .patch(&path)
            .authorization_bearer(&token)
            .json(&json!({"status": "completed"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let completed: AiDoubleResponse = server
            .patch(&path)
            .authorization_bearer(&token)
            .json(&json!({"status": "completed", "voice_id": "voice-123", "is_public": true}))
            .await
            .json();
        assert_eq!(completed.status, AiDoubleStatus::Completed);
        assert!(completed.completed_at.is_some());

        let shared: SharedAiDoubleResponse = server
            .get(&format!("/api/ai-doubles/shared/{}", created.share_slug))
            .await
            .json();
        assert_eq!(shared.voice_id.as_deref(), Some("voice-123"));

        let listed: Vec<AiDoubleResponse> = server.get("/api/ai-doubles").authorization_bearer(&token).await.json();
        assert_eq!(listed.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_shared_view_requires_public_and_completed(pool: PgPool) {
        let owner = create_test_user(&pool, "owner@example.com").await;
        let server = create_test_server(pool).await;
        let token = user_token(owner.id);

        let created: AiDoubleResponse = server
            .post("/api/ai-doubles")
            .authorization_bearer(&token)
            .json(&json!({"name": "Draft"}))
            .await
            .json();
        let shared_path = format!("/api/ai-doubles/shared/{}", created.share_slug);
        let path = format!("/api/ai-doubles/{}", created.id);

        server.get(&shared_path).await.assert_status_not_found();

        server
            .patch(&path)
            .authorization_bearer(&token)
            .json(&json!({"is_public": true}))
            .await
            .assert_status_ok();
        server.get(&shared_path).await.assert_status_not_found();

        server
            .patch(&path)
            .authorization_bearer(&token)
            .json(&json!({"voice_id": "v1", "status": "completed", "is_public": false}))
            .await
            .assert_status_ok();
        server.get(&shared_path).await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_doubles_are_private_to_owner(pool: PgPool) {
        let owner = create_test_user(&pool, "owner@example.com").await;
        let other = create_test_user(&pool, "other@example.com").await;
        let server = create_test_server(pool).await;

        let created: AiDoubleResponse = server
            .post("/api/ai-doubles")
            .authorization_bearer(user_token(owner.id))
            .json(&json!({"name": "Mine"}))
            .await
            .json();
        let path = format!("/api/ai-doubles/{}", created.id);

        server.get(&path).authorization_bearer(user_token(other.id)).await.assert_status_not_found();
        server
            .delete(&path)
            .authorization_bearer(user_token(other.id))
            .await
            .assert_status_not_found();

        server
            .delete(&path)
            .authorization_bearer(user_token(owner.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server.get(&path).authorization_bearer(user_token(owner.id)).await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_blank_name_rejected(pool: PgPool) {
        let owner = create_test_user(&pool, "owner@example.com").await;
        let server = create_test_server(pool).await;

        server
            .post("/api/ai-doubles")
            .authorization_bearer(user_token(owner.id))
            .json(&json!({"name": "   "}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
