use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{JsonBody, PathParams},
        handlers::required_text,
        models::{
            creators::{CreatorProfileResponse, CreatorResponse, CreatorUpdate, CurrentCreator},
            gallery::{GalleryPhotoCreate, GalleryPhotoResponse},
            users::CurrentUser,
        },
    },
    db::{
        handlers::{
            Creators, GalleryPhotos, Subscriptions,
            creators::CreatorFilter,
            repository::Repository,
        },
        models::{
            creators::{CreatorDBResponse, CreatorUpdateDBRequest},
            gallery_photos::GalleryPhotoCreateDBRequest,
        },
    },
    errors::Error,
    types::GalleryPhotoId,
};
use sqlx::PgConnection;

/// An active creator by slug, or 404.
pub(crate) async fn active_creator_by_slug(conn: &mut PgConnection, slug: &str) -> Result<CreatorDBResponse, Error> {
    Creators::new(conn)
        .get_by_slug(&slug.trim().to_lowercase())
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| Error::NotFound {
            resource: "Creator".to_string(),
            id: slug.to_string(),
        })
}

/// List active creators
#[utoipa::path(
    get,
    path = "/creators",
    tag = "creators",
    responses(
        (status = 200, description = "Active creators", body = [CreatorResponse]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_creators(State(state): State<AppState>) -> Result<Json<Vec<CreatorResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let creators = Creators::new(&mut conn)
        .list(&CreatorFilter::new(0, i64::MAX).active_only())
        .await?;

    Ok(Json(creators.into_iter().map(CreatorResponse::from).collect()))
}

/// Get a creator's public profile
#[utoipa::path(
    get,
    path = "/creators/{slug}",
    tag = "creators",
    params(("slug" = String, Path, description = "Creator slug")),
    responses(
        (status = 200, description = "Creator profile", body = CreatorResponse),
        (status = 404, description = "Creator not found"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_creator(State(state): State<AppState>, PathParams(slug): PathParams<String>) -> Result<Json<CreatorResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let creator = active_creator_by_slug(&mut conn, &slug).await?;

    Ok(Json(creator.into()))
}

/// Get a creator's gallery. Locked photos only carry a URL for subscribers.
#[utoipa::path(
    get,
    path = "/creators/{slug}/gallery",
    tag = "creators",
    params(("slug" = String, Path, description = "Creator slug")),
    responses(
        (status = 200, description = "Gallery photos in display order", body = [GalleryPhotoResponse]),
        (status = 404, description = "Creator not found"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_gallery(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    PathParams(slug): PathParams<String>,
) -> Result<Json<Vec<GalleryPhotoResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let creator = active_creator_by_slug(&mut conn, &slug).await?;

    let subscribed = match viewer {
        Some(viewer) => Subscriptions::new(&mut conn).is_active(viewer.id, creator.id).await?,
        None => false,
    };

    let photos = GalleryPhotos::new(&mut conn).list_for_creator(creator.id).await?;
    Ok(Json(
        photos.into_iter().map(|p| GalleryPhotoResponse::new(p, subscribed)).collect(),
    ))
}

/// The logged-in creator's own profile
#[utoipa::path(
    get,
    path = "/creator/profile",
    tag = "creator",
    responses(
        (status = 200, description = "Creator profile", body = CreatorProfileResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current: CurrentCreator) -> Result<Json<CreatorProfileResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let creator = Creators::new(&mut conn).get_by_id(current.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Creator".to_string(),
        id: current.id.to_string(),
    })?;

    Ok(Json(creator.into()))
}

/// Edit the logged-in creator's profile
#[utoipa::path(
    patch,
    path = "/creator/profile",
    tag = "creator",
    request_body = CreatorUpdate,
    responses(
        (status = 200, description = "Updated profile", body = CreatorProfileResponse),
        (status = 400, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentCreator,
    JsonBody(update): JsonBody<CreatorUpdate>,
) -> Result<Json<CreatorProfileResponse>, Error> {
    let mut request = CreatorUpdateDBRequest::from(update);
    if let Some(name) = &request.name {
        request.name = Some(required_text(name, "name")?);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let creator = Creators::new(&mut conn).update(current.id, &request).await?;

    Ok(Json(creator.into()))
}

/// Add a photo to the logged-in creator's gallery
#[utoipa::path(
    post,
    path = "/creator/gallery",
    tag = "creator",
    request_body = GalleryPhotoCreate,
    responses(
        (status = 201, description = "Photo added", body = GalleryPhotoResponse),
        (status = 400, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_gallery_photo(
    State(state): State<AppState>,
    current: CurrentCreator,
    JsonBody(photo): JsonBody<GalleryPhotoCreate>,
) -> Result<(StatusCode, Json<GalleryPhotoResponse>), Error> {
    let request = GalleryPhotoCreateDBRequest {
        creator_id: current.id,
        url: required_text(&photo.url, "url")?,
        is_locked: photo.is_locked.unwrap_or(false),
        order: photo.order,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let created = GalleryPhotos::new(&mut conn).create(&request).await?;

    Ok((StatusCode::CREATED, Json(GalleryPhotoResponse::new(created, true))))
}

/// Remove a photo from the logged-in creator's gallery
#[utoipa::path(
    delete,
    path = "/creator/gallery/{id}",
    tag = "creator",
    params(("id" = String, Path, description = "Photo ID")),
    responses(
        (status = 204, description = "Photo removed"),
        (status = 404, description = "Photo not found"),
    )
)]
#[tracing::instrument(skip_all, fields(photo_id = %id))]
pub async fn delete_gallery_photo(
    State(state): State<AppState>,
    current: CurrentCreator,
    PathParams(id): PathParams<GalleryPhotoId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !GalleryPhotos::new(&mut conn).delete(id, current.id).await? {
        return Err(Error::NotFound {
            resource: "Gallery photo".to_string(),
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_creator, create_test_server, create_test_user, creator_token, subscribe, user_token};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_profiles_hide_inactive_creators(pool: PgPool) {
        create_test_creator(&pool, "luna").await;
        let hidden = create_test_creator(&pool, "zed").await;
        sqlx::query("UPDATE creators SET is_active = FALSE WHERE id = $1")
            .bind(hidden.id)
            .execute(&pool)
            .await
            .unwrap();
        let server = create_test_server(pool).await;

        let list: Vec<CreatorResponse> = server.get("/api/creators").await.json();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].slug, "luna");

        let raw: serde_json::Value = server.get("/api/creators/luna").await.json();
        assert!(raw.get("password").is_none());
        assert!(raw.get("personality").is_none());

        server.get("/api/creators/zed").await.assert_status_not_found();
        server.get("/api/creators/nobody").await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_gallery_locks_for_non_subscribers(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        let stranger = create_test_user(&pool, "stranger@example.com").await;
        subscribe(&pool, fan.id, creator.id).await;
        let server = create_test_server(pool).await;

        let token = creator_token(creator.id);
        for (url, locked) in [("open.jpg", false), ("locked.jpg", true)] {
            server
                .post("/api/creator/gallery")
                .authorization_bearer(&token)
                .json(&json!({"url": url, "is_locked": locked}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let anonymous: Vec<GalleryPhotoResponse> = server.get("/api/creators/luna/gallery").await.json();
        assert_eq!(anonymous.len(), 2);
        assert_eq!(anonymous[0].url.as_deref(), Some("open.jpg"));
        assert!(anonymous[1].url.is_none());

        let not_subscribed: Vec<GalleryPhotoResponse> = server
            .get("/api/creators/luna/gallery")
            .authorization_bearer(user_token(stranger.id))
            .await
            .json();
        assert!(not_subscribed[1].url.is_none());

        let subscribed: Vec<GalleryPhotoResponse> = server
            .get("/api/creators/luna/gallery")
            .authorization_bearer(user_token(fan.id))
            .await
            .json();
        assert_eq!(subscribed[1].url.as_deref(), Some("locked.jpg"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_profile_self_service(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        let server = create_test_server(pool).await;
        let token = creator_token(creator.id);

        let profile: CreatorProfileResponse = server.get("/api/creator/profile").authorization_bearer(&token).await.json();
        assert_eq!(profile.slug, "luna");

        let updated: CreatorProfileResponse = server
            .patch("/api/creator/profile")
            .authorization_bearer(&token)
            .json(&json!({"bio": "Night owl", "personality": "playful"}))
            .await
            .json();
        assert_eq!(updated.bio.as_deref(), Some("Night owl"));
        assert_eq!(updated.personality.as_deref(), Some("playful"));
        assert_eq!(updated.name, profile.name);

        server
            .patch("/api/creator/profile")
            .authorization_bearer(&token)
            .json(&json!({"name": "   "}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // User sessions cannot reach creator routes
        server
            .get("/api/creator/profile")
            .authorization_bearer(user_token(fan.id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server.get("/api/creator/profile").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_gallery_delete_is_scoped_to_owner(pool: PgPool) {
        let owner = create_test_creator(&pool, "luna").await;
        let other = create_test_creator(&pool, "sol").await;
        let server = create_test_server(pool).await;

        let photo: GalleryPhotoResponse = server
            .post("/api/creator/gallery")
            .authorization_bearer(creator_token(owner.id))
            .json(&json!({"url": "a.jpg"}))
            .await
            .json();

        server
            .delete(&format!("/api/creator/gallery/{}", photo.id))
            .authorization_bearer(creator_token(other.id))
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/api/creator/gallery/{}", photo.id))
            .authorization_bearer(creator_token(owner.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}
