//! Test utilities for integration testing
use crate::{
    AppState, Application,
    auth::{
        password::{Argon2Params, hash_string_with_params},
        session::{PrincipalKind, create_session_token},
    },
    config::Config,
    db::{
        handlers::{Creators, Repository, Subscriptions, Users},
        models::{
            creators::{CreatorCreateDBRequest, CreatorDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::{CreatorId, UserId},
};
use axum_test::TestServer;
use sqlx::PgPool;

/// Password every test account is created with
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Value of `admin_password` in the test config
pub const ADMIN_PASSWORD: &str = "test-admin-password";

fn fast_hash(password: &str) -> String {
    let params = Argon2Params {
        memory_kib: 128,
        iterations: 1,
        parallelism: 1,
    };
    hash_string_with_params(password, Some(params)).expect("Failed to hash test password")
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-session-tokens".to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        ..Default::default()
    };

    // Keep hashing cheap; tests create many accounts
    config.auth.password.argon2_memory_kib = 128;
    config.auth.password.argon2_iterations = 1;
    config.auth.password.argon2_parallelism = 1;
    config.auth.session.cookie_secure = false;
    config.database.run_migrations = false;

    config
}

pub fn create_test_app_state(pool: PgPool) -> AppState {
    AppState::from_config(pool, create_test_config())
}

pub async fn create_test_server(pool: PgPool) -> TestServer {
    create_test_server_with_config(pool, create_test_config()).await
}

pub async fn create_test_server_with_config(pool: PgPool, config: Config) -> TestServer {
    Application::new_with_pool(config, pool)
        .expect("Failed to create application")
        .into_test_server()
}

/// Insert an active user whose password is [`TEST_PASSWORD`]
pub async fn create_test_user(pool: &PgPool, email: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let local = email.split('@').next().unwrap_or(email).to_string();

    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: email.to_lowercase(),
            name: Some(local),
            password_hash: fast_hash(TEST_PASSWORD),
        })
        .await
        .expect("Failed to create test user")
}

/// Insert an active creator whose password is [`TEST_PASSWORD`]
pub async fn create_test_creator(pool: &PgPool, slug: &str) -> CreatorDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut name = slug.replace('-', " ");
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    Creators::new(&mut conn)
        .create(&CreatorCreateDBRequest {
            name,
            slug: slug.to_lowercase(),
            password: Some(fast_hash(TEST_PASSWORD)),
            bio: Some(format!("Bio for {slug}")),
            avatar_url: None,
            personality: None,
        })
        .await
        .expect("Failed to create test creator")
}

pub async fn subscribe(pool: &PgPool, user_id: UserId, creator_id: CreatorId) {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Subscriptions::new(&mut conn)
        .subscribe(user_id, creator_id)
        .await
        .expect("Failed to subscribe");
}

pub fn user_token(user_id: UserId) -> String {
    create_session_token(user_id, PrincipalKind::User, &create_test_config()).expect("Failed to create user token")
}

pub fn creator_token(creator_id: CreatorId) -> String {
    create_session_token(creator_id, PrincipalKind::Creator, &create_test_config()).expect("Failed to create creator token")
}
