//! Admin dashboard endpoints.
//!
//! Every handler takes [`AdminAccess`], which checks the `X-Admin-Password` header against the
//! configured admin password. Listings are paginated and never include password hashes.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{JsonBody, QueryParams},
        handlers::required_text,
        models::{
            admin::PlatformStatsResponse,
            ai_doubles::{AiDoubleResponse, ListAiDoublesQuery},
            content_requests::{ContentRequestResponse, ListContentRequestsQuery},
            creators::{CreatorCreate, CreatorProfileResponse},
            messages::{ListMessagesQuery, MessageResponse},
            pagination::{PaginatedResponse, Pagination},
            subscriptions::{ListSubscriptionsQuery, SubscriptionResponse},
            users::{ListUsersQuery, UserResponse},
        },
    },
    auth::{
        current_user::AdminAccess,
        password::{self, Argon2Params},
    },
    db::{
        handlers::{
            AiDoubles, ContentRequests, Creators, Messages, Subscriptions, Users, admin as admin_queries,
            ai_doubles::AiDoubleFilter, content_requests::ContentRequestFilter, creators::CreatorFilter, messages::MessageFilter,
            repository::Repository, subscriptions::SubscriptionFilter, users::UserFilter,
        },
        models::creators::CreatorCreateDBRequest,
    },
    errors::Error,
    types::slugify,
};

/// Platform-wide counters
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    params(("x-admin-password" = String, Header, description = "Admin password")),
    responses(
        (status = 200, description = "Platform statistics", body = PlatformStatsResponse),
        (status = 401, description = "Missing or wrong admin password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_stats(State(state): State<AppState>, _: AdminAccess) -> Result<Json<PlatformStatsResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stats = admin_queries::platform_stats(&mut conn).await?;

    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(ListUsersQuery, ("x-admin-password" = String, Header, description = "Admin password")),
    responses(
        (status = 200, description = "Paginated users, newest first", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Missing or wrong admin password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _: AdminAccess,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = UserFilter::new(skip, limit).with_search(query.search);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let users = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        users.into_iter().map(Into::into).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/admin/creators",
    tag = "admin",
    params(Pagination, ("x-admin-password" = String, Header, description = "Admin password")),
    responses(
        (status = 200, description = "Paginated creators, newest first", body = PaginatedResponse<CreatorProfileResponse>),
        (status = 401, description = "Missing or wrong admin password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_creators(
    State(state): State<AppState>,
    _: AdminAccess,
    QueryParams(pagination): QueryParams<Pagination>,
) -> Result<Json<PaginatedResponse<CreatorProfileResponse>>, Error> {
    let (skip, limit) = pagination.params();
    let filter = CreatorFilter::new(skip, limit);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Creators::new(&mut conn);
    let creators = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        creators.into_iter().map(Into::into).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/admin/messages",
    tag = "admin",
    params(ListMessagesQuery, ("x-admin-password" = String, Header, description = "Admin password")),
    responses(
        (status = 200, description = "Paginated messages, newest first", body = PaginatedResponse<MessageResponse>),
        (status = 401, description = "Missing or wrong admin password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_messages(
    State(state): State<AppState>,
    _: AdminAccess,
    QueryParams(query): QueryParams<ListMessagesQuery>,
) -> Result<Json<PaginatedResponse<MessageResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = MessageFilter {
        skip,
        limit,
        user_id: query.user_id,
        creator_id: query.creator_id,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Messages::new(&mut conn);
    let messages = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        messages.into_iter().map(Into::into).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/admin/content-requests",
    tag = "admin",
    params(ListContentRequestsQuery, ("x-admin-password" = String, Header, description = "Admin password")),
    responses(
        (status = 200, description = "Paginated content requests, newest first", body = PaginatedResponse<ContentRequestResponse>),
        (status = 401, description = "Missing or wrong admin password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_content_requests(
    State(state): State<AppState>,
    _: AdminAccess,
    QueryParams(query): QueryParams<ListContentRequestsQuery>,
) -> Result<Json<PaginatedResponse<ContentRequestResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = ContentRequestFilter {
        skip,
        limit,
        status: query.status,
        ..Default::default()
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ContentRequests::new(&mut conn);
    let requests = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        requests.into_iter().map(Into::into).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/admin/subscriptions",
    tag = "admin",
    params(ListSubscriptionsQuery, ("x-admin-password" = String, Header, description = "Admin password")),
    responses(
        (status = 200, description = "Paginated subscriptions, newest first", body = PaginatedResponse<SubscriptionResponse>),
        (status = 401, description = "Missing or wrong admin password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    _: AdminAccess,
    QueryParams(query): QueryParams<ListSubscriptionsQuery>,
) -> Result<Json<PaginatedResponse<SubscriptionResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = SubscriptionFilter {
        skip,
        limit,
        status: query.status,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Subscriptions::new(&mut conn);
    let subscriptions = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        subscriptions.into_iter().map(Into::into).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/admin/ai-doubles",
    tag = "admin",
    params(ListAiDoublesQuery, ("x-admin-password" = String, Header, description = "Admin password")),
    responses(
        (status = 200, description = "Paginated AI doubles, newest first", body = PaginatedResponse<AiDoubleResponse>),
        (status = 401, description = "Missing or wrong admin password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_ai_doubles(
    State(state): State<AppState>,
    _: AdminAccess,
    QueryParams(query): QueryParams<ListAiDoublesQuery>,
) -> Result<Json<PaginatedResponse<AiDoubleResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = AiDoubleFilter {
        skip,
        limit,
        user_id: None,
        status: query.status,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = AiDoubles::new(&mut conn);
    let doubles = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        doubles.into_iter().map(Into::into).collect(),
        total_count,
        skip,
        limit,
    )))
}

/// Onboard a creator. The password is stored as an Argon2 hash.
#[utoipa::path(
    post,
    path = "/admin/creators",
    tag = "admin",
    params(("x-admin-password" = String, Header, description = "Admin password")),
    request_body = CreatorCreate,
    responses(
        (status = 201, description = "Creator created", body = CreatorProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or wrong admin password"),
        (status = 409, description = "A creator with this slug already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_creator(
    State(state): State<AppState>,
    _: AdminAccess,
    JsonBody(request): JsonBody<CreatorCreate>,
) -> Result<(StatusCode, Json<CreatorProfileResponse>), Error> {
    required_text(&request.name, "name")?;
    let slug = request.slug.trim().to_lowercase();
    if slug.is_empty() || slugify(&slug) != slug {
        return Err(Error::BadRequest {
            message: "slug must contain only lowercase letters, digits and single dashes".to_string(),
        });
    }
    password::validate_length(&request.password, &state.config.auth.password)?;

    let password_hash = password::hash_blocking(request.password.clone(), Argon2Params::from(&state.config.auth.password)).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let creator = Creators::new(&mut conn)
        .create(&CreatorCreateDBRequest::new(request, password_hash))
        .await?;

    tracing::info!(creator_id = %creator.id, "Creator onboarded");
    Ok((StatusCode::CREATED, Json(creator.into())))
}
