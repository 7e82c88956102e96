use std::collections::HashSet;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{JsonBody, PathParams, QueryParams},
        handlers::required_text,
        models::{
            creators::CurrentCreator,
            stories::{ListStoriesQuery, PublicStoryResponse, StoryCreate, StoryResponse, StoryStatus, StoryUpdate, StoryViewResponse},
            subscriptions::SubscriptionStatus,
            users::CurrentUser,
        },
    },
    config::StoriesConfig,
    db::{
        errors::DbError,
        handlers::{Stories, Subscriptions},
        models::stories::{StoryCreateDBRequest, StoryUpdateDBRequest},
    },
    errors::Error,
    types::StoryId,
};

fn resolve_duration(requested: Option<i32>, config: &StoriesConfig) -> Result<i32, Error> {
    let hours = requested.unwrap_or(config.default_duration_hours);
    if !(1..=config.max_duration_hours).contains(&hours) {
        return Err(Error::BadRequest {
            message: format!("duration_hours must be between 1 and {}", config.max_duration_hours),
        });
    }
    Ok(hours)
}

fn story_not_found(id: StoryId) -> Error {
    Error::NotFound {
        resource: "Story".to_string(),
        id: id.to_string(),
    }
}

/// Publish a story
#[utoipa::path(
    post,
    path = "/creator/stories",
    tag = "creator",
    request_body = StoryCreate,
    responses(
        (status = 201, description = "Story published", body = StoryResponse),
        (status = 400, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id))]
pub async fn create_story(
    State(state): State<AppState>,
    current: CurrentCreator,
    JsonBody(request): JsonBody<StoryCreate>,
) -> Result<(StatusCode, Json<StoryResponse>), Error> {
    let media_url = required_text(&request.media_url, "media_url")?;
    let duration_hours = resolve_duration(request.duration_hours, &state.config.stories)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let story = Stories::new(&mut conn)
        .create(&StoryCreateDBRequest {
            creator_id: current.id,
            title: request.title,
            media_url,
            media_type: request.media_type,
            caption: request.caption,
            duration_hours,
            is_locked: request.is_locked.unwrap_or(false),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(story.into())))
}

/// Live stories, newest first. Locked media is only shown to subscribers of the story's creator.
#[utoipa::path(
    get,
    path = "/stories",
    tag = "stories",
    params(ListStoriesQuery),
    responses(
        (status = 200, description = "Active, unexpired stories", body = [PublicStoryResponse]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_stories(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    QueryParams(query): QueryParams<ListStoriesQuery>,
) -> Result<Json<Vec<PublicStoryResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let subscribed: HashSet<_> = match viewer {
        Some(viewer) => Subscriptions::new(&mut conn)
            .list_for_user(viewer.id)
            .await?
            .into_iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .map(|s| s.creator_id)
            .collect(),
        None => HashSet::new(),
    };

    let stories = Stories::new(&mut conn).list_public(query.creator_id).await?;
    Ok(Json(
        stories
            .into_iter()
            .map(|story| {
                let unlocked = subscribed.contains(&story.creator_id);
                PublicStoryResponse::new(story, unlocked)
            })
            .collect(),
    ))
}

/// Every story of the logged-in creator, labelled `active`, `expired` or `inactive`
#[utoipa::path(
    get,
    path = "/creator/my-stories",
    tag = "creator",
    responses(
        (status = 200, description = "All stories, newest first", body = [StoryResponse]),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id))]
pub async fn my_stories(State(state): State<AppState>, current: CurrentCreator) -> Result<Json<Vec<StoryResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stories = Stories::new(&mut conn).list_for_creator(current.id).await?;

    Ok(Json(stories.into_iter().map(Into::into).collect()))
}

/// Record that the logged-in user viewed a story. Repeat views are not counted again.
#[utoipa::path(
    post,
    path = "/stories/{id}/view",
    tag = "stories",
    params(("id" = String, Path, description = "Story ID")),
    responses(
        (status = 200, description = "Current distinct view count", body = StoryViewResponse),
        (status = 403, description = "Story is locked to subscribers"),
        (status = 404, description = "Story not found or no longer live"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, story_id = %id))]
pub async fn view_story(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParams(id): PathParams<StoryId>,
) -> Result<Json<StoryViewResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let story = Stories::new(&mut conn)
        .get_by_id(id)
        .await?
        .filter(|s| s.status == StoryStatus::Active)
        .ok_or_else(|| story_not_found(id))?;

    if story.is_locked && !Subscriptions::new(&mut conn).is_active(current_user.id, story.creator_id).await? {
        return Err(Error::Forbidden {
            message: "Subscribe to this creator to view this story".to_string(),
        });
    }

    let view_count = Stories::new(&mut conn).record_view(id, current_user.id).await?;
    Ok(Json(StoryViewResponse { story_id: id, view_count }))
}

/// Edit one of the logged-in creator's stories
#[utoipa::path(
    patch,
    path = "/creator/stories/{id}",
    tag = "creator",
    params(("id" = String, Path, description = "Story ID")),
    request_body = StoryUpdate,
    responses(
        (status = 200, description = "Story updated", body = StoryResponse),
        (status = 404, description = "Story not found"),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id, story_id = %id))]
pub async fn update_story(
    State(state): State<AppState>,
    current: CurrentCreator,
    PathParams(id): PathParams<StoryId>,
    JsonBody(request): JsonBody<StoryUpdate>,
) -> Result<Json<StoryResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let story = Stories::new(&mut conn)
        .update(id, current.id, &StoryUpdateDBRequest::from(request))
        .await
        .map_err(|e| match e {
            DbError::NotFound => story_not_found(id),
            other => other.into(),
        })?;

    Ok(Json(story.into()))
}

/// Delete one of the logged-in creator's stories
#[utoipa::path(
    delete,
    path = "/creator/stories/{id}",
    tag = "creator",
    params(("id" = String, Path, description = "Story ID")),
    responses(
        (status = 204, description = "Story deleted"),
        (status = 404, description = "Story not found"),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id, story_id = %id))]
pub async fn delete_story(
    State(state): State<AppState>,
    current: CurrentCreator,
    PathParams(id): PathParams<StoryId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Stories::new(&mut conn).delete(id, current.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(story_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_creator, create_test_server, create_test_user, creator_token, subscribe, user_token};
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;

    async fn publish(server: &TestServer, token: &str, body: serde_json::Value) -> StoryResponse {
        let response = server.post("/api/creator/stories").authorization_bearer(token).json(&body).await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[test]
    fn test_resolve_duration() {
        let config = StoriesConfig::default();

        assert_eq!(resolve_duration(None, &config).unwrap(), config.default_duration_hours);
        assert_eq!(resolve_duration(Some(1), &config).unwrap(), 1);
        assert_eq!(resolve_duration(Some(config.max_duration_hours), &config).unwrap(), config.max_duration_hours);
        assert!(resolve_duration(Some(0), &config).is_err());
        assert!(resolve_duration(Some(config.max_duration_hours + 1), &config).is_err());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_story_defaults(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let server = create_test_server(pool).await;
        let token = creator_token(creator.id);

        let story = publish(
            &server,
            &token,
            json!({"media_url": "https://cdn.example.com/a.jpg", "media_type": "image"}),
        )
        .await;
        assert_eq!(story.duration_hours, 24);
        assert!(!story.is_locked);
        assert_eq!(story.status, StoryStatus::Active);
        assert_eq!((story.expires_at - story.created_at).num_hours(), 24);

        server
            .post("/api/creator/stories")
            .authorization_bearer(&token)
            .json(&json!({"media_url": "https://cdn.example.com/a.jpg", "media_type": "image", "duration_hours": 0}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/api/creator/stories")
            .authorization_bearer(&token)
            .json(&json!({"media_type": "image"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_listing_hides_expired_inactive_and_locked_media(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        let server = create_test_server(pool.clone()).await;
        let token = creator_token(creator.id);

        let open = publish(&server, &token, json!({"media_url": "https://cdn/open.jpg", "media_type": "image"})).await;
        let locked = publish(
            &server,
            &token,
            json!({"media_url": "https://cdn/locked.mp4", "media_type": "video", "is_locked": true}),
        )
        .await;
        let expired = publish(&server, &token, json!({"media_url": "https://cdn/old.jpg", "media_type": "image"})).await;
        let hidden = publish(&server, &token, json!({"media_url": "https://cdn/hidden.jpg", "media_type": "image"})).await;

        sqlx::query("UPDATE stories SET expires_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
            .bind(expired.id)
            .execute(&pool)
            .await
            .unwrap();
        server
            .patch(&format!("/api/creator/stories/{}", hidden.id))
            .authorization_bearer(&token)
            .json(&json!({"is_active": false}))
            .await
            .assert_status_ok();

        let anonymous: Vec<PublicStoryResponse> = server.get("/api/stories").await.json();
        let ids: Vec<_> = anonymous.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![locked.id, open.id]);
        assert_eq!(anonymous[0].media_url, None);
        assert_eq!(anonymous[1].media_url.as_deref(), Some("https://cdn/open.jpg"));

        subscribe(&pool, fan.id, creator.id).await;
        let subscribed: Vec<PublicStoryResponse> = server
            .get(&format!("/api/stories?creator_id={}", creator.id))
            .authorization_bearer(user_token(fan.id))
            .await
            .json();
        assert_eq!(subscribed[0].media_url.as_deref(), Some("https://cdn/locked.mp4"));

        let mine: Vec<StoryResponse> = server.get("/api/creator/my-stories").authorization_bearer(&token).await.json();
        let labels: Vec<_> = mine.iter().map(|s| (s.id, s.status)).collect();
        assert_eq!(
            labels,
            vec![
                (hidden.id, StoryStatus::Inactive),
                (expired.id, StoryStatus::Expired),
                (locked.id, StoryStatus::Active),
                (open.id, StoryStatus::Active),
            ]
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_view_does_not_double_count(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        let other = create_test_user(&pool, "other@example.com").await;
        let server = create_test_server(pool).await;

        let story = publish(
            &server,
            &creator_token(creator.id),
            json!({"media_url": "https://cdn/a.jpg", "media_type": "image"}),
        )
        .await;
        let path = format!("/api/stories/{}/view", story.id);

        let first: StoryViewResponse = server.post(&path).authorization_bearer(user_token(fan.id)).await.json();
        let repeat: StoryViewResponse = server.post(&path).authorization_bearer(user_token(fan.id)).await.json();
        assert_eq!(first.view_count, 1);
        assert_eq!(repeat.view_count, 1);

        let second_viewer: StoryViewResponse = server.post(&path).authorization_bearer(user_token(other.id)).await.json();
        assert_eq!(second_viewer.view_count, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_view_guards(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        let server = create_test_server(pool.clone()).await;
        let token = creator_token(creator.id);

        let locked = publish(
            &server,
            &token,
            json!({"media_url": "https://cdn/l.jpg", "media_type": "image", "is_locked": true}),
        )
        .await;
        let path = format!("/api/stories/{}/view", locked.id);

        server
            .post(&path)
            .authorization_bearer(user_token(fan.id))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        subscribe(&pool, fan.id, creator.id).await;
        server.post(&path).authorization_bearer(user_token(fan.id)).await.assert_status_ok();

        server
            .delete(&format!("/api/creator/stories/{}", locked.id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .post(&path)
            .authorization_bearer(user_token(fan.id))
            .await
            .assert_status_not_found();

        let malformed = server
            .post("/api/stories/not-a-uuid/view")
            .authorization_bearer(user_token(fan.id))
            .await;
        malformed.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = malformed.json();
        assert!(body["error"].is_string(), "{body}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_other_creators_cannot_edit(pool: PgPool) {
        let luna = create_test_creator(&pool, "luna").await;
        let sol = create_test_creator(&pool, "sol").await;
        let server = create_test_server(pool).await;

        let story = publish(
            &server,
            &creator_token(luna.id),
            json!({"media_url": "https://cdn/a.jpg", "media_type": "image"}),
        )
        .await;

        server
            .patch(&format!("/api/creator/stories/{}", story.id))
            .authorization_bearer(creator_token(sol.id))
            .json(&json!({"title": "mine now"}))
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/api/creator/stories/{}", story.id))
            .authorization_bearer(creator_token(sol.id))
            .await
            .assert_status_not_found();
    }
}
