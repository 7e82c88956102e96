//! OpenAPI documentation for the `/api/*` surface.
//!
//! Served as JSON at `/api/openapi.json` and rendered with Scalar at `/api/docs`. Handler paths
//! are declared relative to `/api`, which is the document's single server entry.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::{handlers, models};

/// Session and admin authentication schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token returned by the login and register endpoints. Include it in the \
                             `Authorization` header:\n\n```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "CookieAuth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "fanline_session",
                    "Session cookie set by the login and register endpoints",
                ))),
            );
            components.add_security_scheme(
                "AdminPassword",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-admin-password",
                    "Shared admin password, required on every /admin route",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fanline API",
        description = "Subscriptions, messaging, custom content orders and stories between users and creators."
    ),
    servers((url = "/api")),
    modifiers(&SecurityAddon),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::login_creator,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::creators::list_creators,
        handlers::creators::get_creator,
        handlers::creators::get_gallery,
        handlers::creators::get_profile,
        handlers::creators::update_profile,
        handlers::creators::add_gallery_photo,
        handlers::creators::delete_gallery_photo,
        handlers::subscriptions::subscribe,
        handlers::subscriptions::list_subscriptions,
        handlers::subscriptions::cancel_subscription,
        handlers::messages::get_conversation,
        handlers::messages::send_message,
        handlers::messages::list_conversations,
        handlers::messages::get_creator_conversation,
        handlers::messages::send_creator_message,
        handlers::content_requests::create_content_request,
        handlers::content_requests::list_user_content_requests,
        handlers::content_requests::list_creator_content_requests,
        handlers::content_requests::set_price,
        handlers::content_requests::authorize_payment,
        handlers::content_requests::deliver,
        handlers::content_requests::cancel_as_user,
        handlers::content_requests::cancel_as_creator,
        handlers::stories::create_story,
        handlers::stories::list_stories,
        handlers::stories::my_stories,
        handlers::stories::view_story,
        handlers::stories::update_story,
        handlers::stories::delete_story,
        handlers::ai_doubles::create_ai_double,
        handlers::ai_doubles::list_ai_doubles,
        handlers::ai_doubles::get_ai_double,
        handlers::ai_doubles::update_ai_double,
        handlers::ai_doubles::delete_ai_double,
        handlers::ai_doubles::get_shared_ai_double,
        handlers::admin::get_stats,
        handlers::admin::list_users,
        handlers::admin::list_creators,
        handlers::admin::list_messages,
        handlers::admin::list_content_requests,
        handlers::admin::list_subscriptions,
        handlers::admin::list_ai_doubles,
        handlers::admin::create_creator,
    ),
    components(schemas(
        models::auth::RegisterRequest,
        models::auth::LoginRequest,
        models::auth::CreatorLoginRequest,
        models::auth::AuthResponse,
        models::auth::CreatorAuthResponse,
        models::auth::AuthSuccessResponse,
        models::users::UserResponse,
        models::users::CurrentUser,
        models::creators::CreatorCreate,
        models::creators::CreatorUpdate,
        models::creators::CreatorResponse,
        models::creators::CreatorProfileResponse,
        models::creators::CurrentCreator,
        models::gallery::GalleryPhotoCreate,
        models::gallery::GalleryPhotoResponse,
        models::subscriptions::SubscriptionCreate,
        models::subscriptions::SubscriptionResponse,
        models::subscriptions::SubscriptionStatus,
        models::messages::MessageRole,
        models::messages::MessageCreate,
        models::messages::CreatorMessageCreate,
        models::messages::MessageResponse,
        models::messages::SendMessageResponse,
        models::messages::ConversationSummaryResponse,
        models::content_requests::ContentRequestStatus,
        models::content_requests::ContentRequestCreate,
        models::content_requests::SetPriceRequest,
        models::content_requests::DeliverRequest,
        models::content_requests::ContentRequestResponse,
        models::stories::MediaType,
        models::stories::StoryStatus,
        models::stories::StoryCreate,
        models::stories::StoryUpdate,
        models::stories::StoryResponse,
        models::stories::PublicStoryResponse,
        models::stories::StoryViewResponse,
        models::ai_doubles::AiDoubleStatus,
        models::ai_doubles::AiDoubleCreate,
        models::ai_doubles::AiDoubleUpdate,
        models::ai_doubles::AiDoubleResponse,
        models::ai_doubles::SharedAiDoubleResponse,
        models::admin::PlatformStatsResponse,
        models::admin::ContentRequestCounts,
    )),
    tags(
        (name = "authentication", description = "User and creator sessions"),
        (name = "creators", description = "Public creator profiles and galleries"),
        (name = "creator", description = "Endpoints for the logged-in creator"),
        (name = "subscriptions", description = "User subscriptions to creators"),
        (name = "messages", description = "User side of conversations"),
        (name = "content-requests", description = "Custom content orders"),
        (name = "stories", description = "Time-limited creator posts"),
        (name = "ai-doubles", description = "User voice/persona profiles"),
        (name = "admin", description = "Password-protected platform administration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builds_with_all_routes() {
        let doc = ApiDoc::openapi();

        for path in [
            "/auth/register",
            "/creators/login",
            "/messages",
            "/creator/content-requests/{id}/deliver",
            "/stories/{id}/view",
            "/ai-doubles/shared/{share_slug}",
            "/admin/stats",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("BearerAuth"));
        assert!(schemes.contains_key("AdminPassword"));
    }

    #[test]
    fn test_query_structs_documented_as_parameters() {
        let doc = ApiDoc::openapi();
        let parameter_names = |path: &str| -> Vec<String> {
            let item = &doc.paths.paths[path];
            item.get
                .as_ref()
                .and_then(|op| op.parameters.as_ref())
                .map(|params| params.iter().map(|p| p.name.clone()).collect())
                .unwrap_or_default()
        };

        assert_eq!(parameter_names("/messages"), vec!["creator_id"]);
        assert_eq!(parameter_names("/creator/messages"), vec!["user_id"]);

        let users = parameter_names("/admin/users");
        for name in ["skip", "limit", "search"] {
            assert!(users.iter().any(|p| p == name), "missing {name} in {users:?}");
        }
    }
}
