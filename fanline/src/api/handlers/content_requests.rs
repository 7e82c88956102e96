//! Custom content orders.
//!
//! Every status change runs in one transaction that first takes the request's row lock, so two
//! concurrent transitions on the same request serialize and the second sees the first's result.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    AppState,
    api::{
        extract::{JsonBody, PathParams, QueryParams},
        handlers::required_text,
        models::{
            content_requests::{
                ContentRequestCreate, ContentRequestResponse, ContentRequestStatus, DeliverRequest, ListContentRequestsQuery,
                SetPriceRequest,
            },
            creators::CurrentCreator,
            messages::MessageRole,
            pagination::PaginatedResponse,
            users::CurrentUser,
        },
    },
    db::{
        handlers::{ContentRequests, Creators, Messages, content_requests::ContentRequestFilter, repository::Repository},
        models::{
            content_requests::{ContentRequestCreateDBRequest, ContentRequestDBResponse},
            messages::MessageCreateDBRequest,
        },
    },
    errors::Error,
    payment_providers::PaymentError,
    types::{ContentRequestId, CreatorId, UserId},
};

const DELIVERY_NOTE: &str = "Your custom content is ready!";

/// Which side of the order is acting
#[derive(Debug, Clone, Copy)]
enum Party {
    User(UserId),
    Creator(CreatorId),
}

impl Party {
    fn owns(self, request: &ContentRequestDBResponse) -> bool {
        match self {
            Party::User(id) => request.user_id == id,
            Party::Creator(id) => request.creator_id == id,
        }
    }
}

/// Lock a request the caller is party to. Unknown and foreign requests are both 404.
async fn lock_owned(conn: &mut PgConnection, id: ContentRequestId, party: Party) -> Result<ContentRequestDBResponse, Error> {
    ContentRequests::new(conn)
        .lock_for_update(id)
        .await?
        .filter(|r| party.owns(r))
        .ok_or_else(|| Error::NotFound {
            resource: "Content request".to_string(),
            id: id.to_string(),
        })
}

fn check_transition(current: ContentRequestStatus, next: ContentRequestStatus) -> Result<(), Error> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: format!("Cannot move a {current} request to {next}"),
        })
    }
}

/// Cancel a request on behalf of either party, voiding any held authorization first.
async fn cancel(state: &AppState, id: ContentRequestId, party: Party) -> Result<ContentRequestDBResponse, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let request = lock_owned(&mut tx, id, party).await?;

    if request.status.is_settled() {
        return Err(Error::BadRequest {
            message: format!("Cannot cancel a {} request", request.status),
        });
    }
    check_transition(request.status, ContentRequestStatus::Cancelled)?;

    if let Some(authorization_id) = request.paypal_authorization_id.as_deref() {
        state.payment_provider.void(authorization_id).await?;
    }

    let cancelled = ContentRequests::new(&mut tx)
        .set_status(id, ContentRequestStatus::Cancelled)
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(request_id = %id, party = ?party, "Content request cancelled");
    Ok(cancelled)
}

/// Order custom content from a creator
#[utoipa::path(
    post,
    path = "/content-requests",
    tag = "content-requests",
    request_body = ContentRequestCreate,
    responses(
        (status = 201, description = "Request created", body = ContentRequestResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Creator not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn create_content_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(request): JsonBody<ContentRequestCreate>,
) -> Result<(StatusCode, Json<ContentRequestResponse>), Error> {
    let message = required_text(&request.message, "message")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Creators::new(&mut conn)
        .get_by_id(request.creator_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| Error::NotFound {
            resource: "Creator".to_string(),
            id: request.creator_id.to_string(),
        })?;

    let created = ContentRequests::new(&mut conn)
        .create(&ContentRequestCreateDBRequest {
            creator_id: request.creator_id,
            user_id: current_user.id,
            message,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn list_page(
    state: &AppState,
    filter: ContentRequestFilter,
) -> Result<Json<PaginatedResponse<ContentRequestResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ContentRequests::new(&mut conn);

    let requests = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        requests.into_iter().map(Into::into).collect(),
        total_count,
        filter.skip,
        filter.limit,
    )))
}

/// The logged-in user's content requests
#[utoipa::path(
    get,
    path = "/content-requests",
    tag = "content-requests",
    params(ListContentRequestsQuery),
    responses(
        (status = 200, description = "Paginated requests, newest first", body = PaginatedResponse<ContentRequestResponse>),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn list_user_content_requests(
    State(state): State<AppState>,
    current_user: CurrentUser,
    QueryParams(query): QueryParams<ListContentRequestsQuery>,
) -> Result<Json<PaginatedResponse<ContentRequestResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    list_page(
        &state,
        ContentRequestFilter {
            skip,
            limit,
            user_id: Some(current_user.id),
            status: query.status,
            ..Default::default()
        },
    )
    .await
}

/// Content requests addressed to the logged-in creator
#[utoipa::path(
    get,
    path = "/creator/content-requests",
    tag = "creator",
    params(ListContentRequestsQuery),
    responses(
        (status = 200, description = "Paginated requests, newest first", body = PaginatedResponse<ContentRequestResponse>),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id))]
pub async fn list_creator_content_requests(
    State(state): State<AppState>,
    current: CurrentCreator,
    QueryParams(query): QueryParams<ListContentRequestsQuery>,
) -> Result<Json<PaginatedResponse<ContentRequestResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    list_page(
        &state,
        ContentRequestFilter {
            skip,
            limit,
            creator_id: Some(current.id),
            status: query.status,
            ..Default::default()
        },
    )
    .await
}

/// Quote a price for a pending request
#[utoipa::path(
    post,
    path = "/creator/content-requests/{id}/price",
    tag = "creator",
    params(("id" = String, Path, description = "Content request ID")),
    request_body = SetPriceRequest,
    responses(
        (status = 200, description = "Request priced", body = ContentRequestResponse),
        (status = 400, description = "Invalid price or request not pending"),
        (status = 404, description = "Content request not found"),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id, request_id = %id))]
pub async fn set_price(
    State(state): State<AppState>,
    current: CurrentCreator,
    PathParams(id): PathParams<ContentRequestId>,
    JsonBody(request): JsonBody<SetPriceRequest>,
) -> Result<Json<ContentRequestResponse>, Error> {
    if request.price <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "price must be greater than 0".to_string(),
        });
    }
    let price = request.price.round_dp(2);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = lock_owned(&mut tx, id, Party::Creator(current.id)).await?;
    check_transition(existing.status, ContentRequestStatus::Priced)?;

    let priced = ContentRequests::new(&mut tx).set_price(id, price).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(priced.into()))
}

/// Accept a creator's price; the payment is authorized (held) but not captured
#[utoipa::path(
    post,
    path = "/content-requests/{id}/authorize",
    tag = "content-requests",
    params(("id" = String, Path, description = "Content request ID")),
    responses(
        (status = 200, description = "Payment authorized", body = ContentRequestResponse),
        (status = 400, description = "Request not priced"),
        (status = 402, description = "Payment declined"),
        (status = 404, description = "Content request not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, request_id = %id))]
pub async fn authorize_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParams(id): PathParams<ContentRequestId>,
) -> Result<Json<ContentRequestResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = lock_owned(&mut tx, id, Party::User(current_user.id)).await?;
    check_transition(existing.status, ContentRequestStatus::Authorized)?;

    let price = existing
        .price
        .ok_or_else(|| Error::Payment(PaymentError::InvalidData("Request has no price".to_string())))?;
    let authorization = state.payment_provider.authorize(id, price).await?;

    let authorized = ContentRequests::new(&mut tx)
        .set_authorized(id, &authorization.authorization_id)
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(authorized.into()))
}

/// Fulfil an authorized request: capture the payment and post the content into the conversation
#[utoipa::path(
    post,
    path = "/creator/content-requests/{id}/deliver",
    tag = "creator",
    params(("id" = String, Path, description = "Content request ID")),
    request_body = DeliverRequest,
    responses(
        (status = 200, description = "Request delivered", body = ContentRequestResponse),
        (status = 400, description = "Request not authorized"),
        (status = 404, description = "Content request not found"),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id, request_id = %id))]
pub async fn deliver(
    State(state): State<AppState>,
    current: CurrentCreator,
    PathParams(id): PathParams<ContentRequestId>,
    JsonBody(request): JsonBody<DeliverRequest>,
) -> Result<Json<ContentRequestResponse>, Error> {
    let content = request
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DELIVERY_NOTE)
        .to_string();
    let media_url = request.media_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = lock_owned(&mut tx, id, Party::Creator(current.id)).await?;
    check_transition(existing.status, ContentRequestStatus::Delivered)?;

    let authorization_id = existing.paypal_authorization_id.as_deref().ok_or_else(|| Error::BadRequest {
        message: "Request has no payment authorization".to_string(),
    })?;

    let delivered = ContentRequests::new(&mut tx)
        .set_status(id, ContentRequestStatus::Delivered)
        .await?;
    Messages::new(&mut tx)
        .create(&MessageCreateDBRequest {
            user_id: existing.user_id,
            creator_id: current.id,
            role: MessageRole::Creator,
            content,
            image_url: media_url,
        })
        .await?;

    // Capture only once both writes have succeeded
    let capture = state.payment_provider.capture(authorization_id).await?;
    tracing::info!(capture_id = %capture.capture_id, "Payment captured");
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(delivered.into()))
}

/// Cancel one of the logged-in user's requests
#[utoipa::path(
    post,
    path = "/content-requests/{id}/cancel",
    tag = "content-requests",
    params(("id" = String, Path, description = "Content request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = ContentRequestResponse),
        (status = 400, description = "Request already delivered, paid or cancelled"),
        (status = 404, description = "Content request not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, request_id = %id))]
pub async fn cancel_as_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParams(id): PathParams<ContentRequestId>,
) -> Result<Json<ContentRequestResponse>, Error> {
    let cancelled = cancel(&state, id, Party::User(current_user.id)).await?;
    Ok(Json(cancelled.into()))
}

/// Decline or withdraw a request addressed to the logged-in creator
#[utoipa::path(
    post,
    path = "/creator/content-requests/{id}/cancel",
    tag = "creator",
    params(("id" = String, Path, description = "Content request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = ContentRequestResponse),
        (status = 400, description = "Request already delivered, paid or cancelled"),
        (status = 404, description = "Content request not found"),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id, request_id = %id))]
pub async fn cancel_as_creator(
    State(state): State<AppState>,
    current: CurrentCreator,
    PathParams(id): PathParams<ContentRequestId>,
) -> Result<Json<ContentRequestResponse>, Error> {
    let cancelled = cancel(&state, id, Party::Creator(current.id)).await?;
    Ok(Json(cancelled.into()))
}
