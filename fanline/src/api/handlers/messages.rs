use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{JsonBody, QueryParams},
        models::{
            creators::CurrentCreator,
            messages::{
                ConversationQuery, ConversationSummaryResponse, CreatorConversationQuery, CreatorMessageCreate, MessageCreate,
                MessageResponse, MessageRole, SendMessageResponse,
            },
            users::CurrentUser,
        },
    },
    config::MessagesConfig,
    db::{
        handlers::{Creators, Messages, Subscriptions, repository::Repository},
        models::messages::MessageCreateDBRequest,
    },
    errors::Error,
};

/// Trim message content and enforce the configured size limit.
fn validate_content(content: &str, config: &MessagesConfig) -> Result<String, Error> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::BadRequest {
            message: "content is required".to_string(),
        });
    }
    if content.chars().count() > config.max_content_length {
        return Err(Error::BadRequest {
            message: format!("content must be at most {} characters", config.max_content_length),
        });
    }
    Ok(content.to_string())
}

fn normalize_image_url(image_url: Option<String>) -> Option<String> {
    image_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

/// The logged-in user's conversation with a creator, oldest first
#[utoipa::path(
    get,
    path = "/messages",
    tag = "messages",
    params(ConversationQuery),
    responses(
        (status = 200, description = "Messages, oldest first", body = [MessageResponse]),
        (status = 400, description = "creator_id missing or invalid"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id, creator_id = %query.creator_id))]
pub async fn get_conversation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    QueryParams(query): QueryParams<ConversationQuery>,
) -> Result<Json<Vec<MessageResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let messages = Messages::new(&mut conn)
        .list_conversation(current_user.id, query.creator_id)
        .await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Send a message to a creator
///
/// After the message is stored, any configured automatic creator messages whose threshold
/// matches the number of messages the user has now sent are inserted in the same transaction
/// and returned as `auto_replies`.
#[utoipa::path(
    post,
    path = "/messages",
    tag = "messages",
    request_body = MessageCreate,
    responses(
        (status = 201, description = "Message stored", body = SendMessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "An active subscription is required"),
        (status = 404, description = "Creator not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn send_message(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(request): JsonBody<MessageCreate>,
) -> Result<(StatusCode, Json<SendMessageResponse>), Error> {
    let content = validate_content(&request.content, &state.config.messages)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Creators::new(&mut conn)
        .get_by_id(request.creator_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| Error::NotFound {
            resource: "Creator".to_string(),
            id: request.creator_id.to_string(),
        })?;

    if state.config.messages.require_subscription
        && !Subscriptions::new(&mut conn).is_active(current_user.id, request.creator_id).await?
    {
        return Err(Error::Forbidden {
            message: "An active subscription is required to message this creator".to_string(),
        });
    }

    let create = MessageCreateDBRequest {
        user_id: current_user.id,
        creator_id: request.creator_id,
        role: MessageRole::User,
        content,
        image_url: normalize_image_url(request.image_url),
    };
    let (message, auto_replies) = Messages::new(&mut conn)
        .send_user_message(&create, &state.config.auto_messages)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: message.into(),
            auto_replies: auto_replies.into_iter().map(Into::into).collect(),
        }),
    ))
}

/// The logged-in creator's inbox
#[utoipa::path(
    get,
    path = "/creator/conversations",
    tag = "creator",
    responses(
        (status = 200, description = "One row per user, most recent first", body = [ConversationSummaryResponse]),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id))]
pub async fn list_conversations(
    State(state): State<AppState>,
    current: CurrentCreator,
) -> Result<Json<Vec<ConversationSummaryResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let conversations = Messages::new(&mut conn).list_conversations(current.id).await?;

    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

/// The logged-in creator's conversation with one user, oldest first
#[utoipa::path(
    get,
    path = "/creator/messages",
    tag = "creator",
    params(CreatorConversationQuery),
    responses(
        (status = 200, description = "Messages, oldest first", body = [MessageResponse]),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id, user_id = %query.user_id))]
pub async fn get_creator_conversation(
    State(state): State<AppState>,
    current: CurrentCreator,
    QueryParams(query): QueryParams<CreatorConversationQuery>,
) -> Result<Json<Vec<MessageResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let messages = Messages::new(&mut conn)
        .list_conversation(query.user_id, current.id)
        .await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Reply to a user as the logged-in creator
#[utoipa::path(
    post,
    path = "/creator/messages",
    tag = "creator",
    request_body = CreatorMessageCreate,
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "No conversation with this user"),
    )
)]
#[tracing::instrument(skip_all, fields(creator_id = %current.id))]
pub async fn send_creator_message(
    State(state): State<AppState>,
    current: CurrentCreator,
    JsonBody(request): JsonBody<CreatorMessageCreate>,
) -> Result<(StatusCode, Json<MessageResponse>), Error> {
    let content = validate_content(&request.content, &state.config.messages)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut messages = Messages::new(&mut conn);

    if !messages.has_relationship(request.user_id, current.id).await? {
        return Err(Error::NotFound {
            resource: "Conversation with user".to_string(),
            id: request.user_id.to_string(),
        });
    }

    let message = messages
        .create(&MessageCreateDBRequest {
            user_id: request.user_id,
            creator_id: current.id,
            role: MessageRole::Creator,
            content,
            image_url: normalize_image_url(request.image_url),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoMessageTrigger;
    use crate::test::utils::{
        create_test_config, create_test_creator, create_test_server, create_test_server_with_config, create_test_user, creator_token,
        subscribe, user_token,
    };
    use serde_json::json;
    use sqlx::PgPool;

    #[test]
    fn test_validate_content() {
        let config = MessagesConfig {
            max_content_length: 5,
            ..Default::default()
        };

        assert_eq!(validate_content("  hey  ", &config).unwrap(), "hey");
        assert!(validate_content("   ", &config).is_err());
        assert!(validate_content("toolong", &config).is_err());
        assert!(validate_content("héllo", &config).is_ok());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_subscription_required_to_message(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        let server = create_test_server(pool.clone()).await;

        let body = json!({"creator_id": creator.id, "content": "hi!"});
        server
            .post("/api/messages")
            .authorization_bearer(user_token(fan.id))
            .json(&body)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        subscribe(&pool, fan.id, creator.id).await;
        let response = server.post("/api/messages").authorization_bearer(user_token(fan.id)).json(&body).await;
        response.assert_status(StatusCode::CREATED);
        let sent: SendMessageResponse = response.json();
        assert_eq!(sent.message.role, MessageRole::User);
        assert!(sent.auto_replies.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_content_is_bad_request(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        subscribe(&pool, fan.id, creator.id).await;
        let server = create_test_server(pool).await;

        server
            .post("/api/messages")
            .authorization_bearer(user_token(fan.id))
            .json(&json!({"creator_id": creator.id}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/api/messages")
            .authorization_bearer(user_token(fan.id))
            .json(&json!({"creator_id": creator.id, "content": "  "}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_auto_reply_fires_once_at_threshold(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        subscribe(&pool, fan.id, creator.id).await;

        let mut config = create_test_config();
        config.auto_messages = vec![AutoMessageTrigger {
            after_user_messages: 2,
            content: "Glad you're here! Check this out".to_string(),
            image_url: Some("https://cdn.example.com/welcome.jpg".to_string()),
        }];
        let server = create_test_server_with_config(pool, config).await;
        let token = user_token(fan.id);

        let mut replies_per_send = Vec::new();
        for text in ["one", "two", "three", "four"] {
            let sent: SendMessageResponse = server
                .post("/api/messages")
                .authorization_bearer(&token)
                .json(&json!({"creator_id": creator.id, "content": text}))
                .await
                .json();
            replies_per_send.push(sent.auto_replies.len());
        }
        assert_eq!(replies_per_send, vec![0, 1, 0, 0]);

        let conversation: Vec<MessageResponse> = server
            .get(&format!("/api/messages?creator_id={}", creator.id))
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation[2].role, MessageRole::Creator);
        assert_eq!(conversation[2].image_url.as_deref(), Some("https://cdn.example.com/welcome.jpg"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_creator_side_of_conversation(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        let stranger = create_test_user(&pool, "stranger@example.com").await;
        subscribe(&pool, fan.id, creator.id).await;
        let server = create_test_server(pool).await;
        let token = creator_token(creator.id);

        server
            .post("/api/messages")
            .authorization_bearer(user_token(fan.id))
            .json(&json!({"creator_id": creator.id, "content": "hello"}))
            .await
            .assert_status(StatusCode::CREATED);

        let inbox: Vec<ConversationSummaryResponse> =
            server.get("/api/creator/conversations").authorization_bearer(&token).await.json();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].user_id, fan.id);
        assert_eq!(inbox[0].message_count, 1);

        let reply = server
            .post("/api/creator/messages")
            .authorization_bearer(&token)
            .json(&json!({"user_id": fan.id, "content": "hey you"}))
            .await;
        reply.assert_status(StatusCode::CREATED);
        let reply: MessageResponse = reply.json();
        assert_eq!(reply.role, MessageRole::Creator);

        server
            .post("/api/creator/messages")
            .authorization_bearer(&token)
            .json(&json!({"user_id": stranger.id, "content": "hi stranger"}))
            .await
            .assert_status_not_found();

        let thread: Vec<MessageResponse> = server
            .get(&format!("/api/creator/messages?user_id={}", fan.id))
            .authorization_bearer(&token)
            .await
            .json();
        let contents: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "hey you"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_long_conversation_returns_newest_messages(pool: PgPool) {
        let creator = create_test_creator(&pool, "luna").await;
        let fan = create_test_user(&pool, "fan@example.com").await;
        subscribe(&pool, fan.id, creator.id).await;
        let server = create_test_server(pool).await;
        let token = user_token(fan.id);

        for n in 0..12 {
            server
                .post("/api/messages")
                .authorization_bearer(&token)
                .json(&json!({"creator_id": creator.id, "content": format!("m{n}")}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let conversation: Vec<MessageResponse> = server
            .get(&format!("/api/messages?creator_id={}", creator.id))
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(conversation.len(), 12);
        assert_eq!(conversation.first().map(|m| m.content.as_str()), Some("m0"));
        assert_eq!(conversation.last().map(|m| m.content.as_str()), Some("m11"));

        let thread: Vec<MessageResponse> = server
            .get(&format!("/api/creator/messages?user_id={}", fan.id))
            .authorization_bearer(creator_token(creator.id))
            .await
            .json();
        assert_eq!(thread.len(), 12);
        assert_eq!(thread.last().map(|m| m.content.as_str()), Some("m11"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bad_conversation_query_is_json_error(pool: PgPool) {
        let fan = create_test_user(&pool, "fan@example.com").await;
        let server = create_test_server(pool).await;

        let missing = server.get("/api/messages").authorization_bearer(user_token(fan.id)).await;
        missing.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = missing.json();
        assert!(body["error"].as_str().is_some_and(|e| e.contains("creator_id")), "{body}");

        let malformed = server
            .get("/api/messages?creator_id=not-a-uuid")
            .authorization_bearer(user_token(fan.id))
            .await;
        malformed.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = malformed.json();
        assert!(body["error"].is_string(), "{body}");
    }
}
