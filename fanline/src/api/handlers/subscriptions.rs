use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{JsonBody, PathParams},
        models::{
            subscriptions::{SubscriptionCreate, SubscriptionResponse},
            users::CurrentUser,
        },
    },
    db::handlers::{Creators, Subscriptions, repository::Repository},
    errors::Error,
    types::SubscriptionId,
};

/// Subscribe to a creator. Re-subscribing re-activates a cancelled subscription.
#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "subscriptions",
    request_body = SubscriptionCreate,
    responses(
        (status = 201, description = "Subscription active", body = SubscriptionResponse),
        (status = 404, description = "Creator not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn subscribe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(request): JsonBody<SubscriptionCreate>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Creators::new(&mut conn)
        .get_by_id(request.creator_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| Error::NotFound {
            resource: "Creator".to_string(),
            id: request.creator_id.to_string(),
        })?;

    let subscription = Subscriptions::new(&mut conn).subscribe(current_user.id, request.creator_id).await?;
    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// The logged-in user's subscriptions
#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Subscriptions, newest first", body = [SubscriptionResponse]),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<SubscriptionResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subscriptions = Subscriptions::new(&mut conn).list_for_user(current_user.id).await?;

    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}

/// Cancel one of the logged-in user's subscriptions
#[utoipa::path(
    post,
    path = "/subscriptions/{id}/cancel",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription cancelled", body = SubscriptionResponse),
        (status = 404, description = "Subscription not found"),
    )
)]
#[tracing::instrument(skip_all, fields(subscription_id = %id))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParams(id): PathParams<SubscriptionId>,
) -> Result<Json<SubscriptionResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subscription = Subscriptions::new(&mut conn)
        .cancel(id, current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Subscription".to_string(),
            id: id.to_string(),
        })?;

    Ok(Json(subscription.into()))
}
