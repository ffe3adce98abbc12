//! Token lifecycle behavior against an in-memory user repository.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use auth_service::db::UserRepository;
use auth_service::error::{AuthError, AuthResult};
use auth_service::models::{DeviceRefreshMap, NewUser, User};
use auth_service::services::TokenService;
use token_codec::TokenCodec;

const ACCESS_SECRET: &[u8] = b"test-access-secret";
const REFRESH_SECRET: &[u8] = b"test-refresh-secret";

#[derive(Default)]
struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, (User, DeviceRefreshMap)>>,
}

impl InMemoryUserRepository {
    fn refresh_map(&self, user_id: Uuid) -> DeviceRefreshMap {
        self.users.lock().unwrap()[&user_id].1.clone()
    }

    fn seed_refresh(&self, user_id: Uuid, fingerprint: &str, token: &str) {
        let mut users = self.users.lock().unwrap();
        users
            .get_mut(&user_id)
            .unwrap()
            .1
            .insert(fingerprint.to_owned(), token.to_owned());
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> AuthResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|(u, _)| u.email == user.email) {
            return Err(AuthError::EmailAlreadyExists);
        }
        users.insert(
            user.id,
            (
                User {
                    id: user.id,
                    email: user.email,
                    password_hash: user.password_hash,
                },
                user.refresh_sessions,
            ),
        );
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<User> {
        let users = self.users.lock().unwrap();
        users
            .values()
            .find(|(u, _)| u.email == email)
            .map(|(u, _)| u.clone())
            .ok_or(AuthError::UserNotFound)
    }

    async fn read_device_refresh_map(&self, user_id: Uuid) -> AuthResult<DeviceRefreshMap> {
        let users = self.users.lock().unwrap();
        users
            .get(&user_id)
            .map(|(_, map)| map.clone())
            .ok_or(AuthError::UserNotFound)
    }

    async fn persist_device_refresh_map(
        &self,
        user_id: Uuid,
        map: &DeviceRefreshMap,
    ) -> AuthResult<()> {
        let mut users = self.users.lock().unwrap();
        users
            .get_mut(&user_id)
            .ok_or(AuthError::UserNotFound)?
            .1
            .clone_from(map);
        Ok(())
    }
}

fn service() -> (Arc<TokenService>, Arc<InMemoryUserRepository>) {
    let codec = Arc::new(TokenCodec::new(ACCESS_SECRET, REFRESH_SECRET));
    let users = Arc::new(InMemoryUserRepository::default());
    (
        Arc::new(TokenService::new(codec, users.clone())),
        users,
    )
}

/// Craft a refresh token with an arbitrary expiry, signed with the service's
/// refresh secret (claim shape matches the codec's).
fn refresh_token_with_exp(subject: &str, exp: i64) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        exp: i64,
        class: &'a str,
        jti: String,
    }
    encode(
        &Header::default(),
        &Claims {
            sub: subject,
            exp,
            class: "refresh",
            jti: Uuid::new_v4().to_string(),
        },
        &EncodingKey::from_secret(REFRESH_SECRET),
    )
    .unwrap()
}

async fn registered_user(
    tokens: &TokenService,
    users: &InMemoryUserRepository,
    fingerprint: &str,
) -> (Uuid, String) {
    let session = tokens
        .register("buyer@example.com", "hunter2abc", fingerprint)
        .await
        .unwrap();
    let user_id = users
        .find_by_email("buyer@example.com")
        .await
        .unwrap()
        .id;
    (user_id, session.refresh_token)
}

#[tokio::test]
async fn login_reuses_live_refresh_token() {
    let (tokens, users) = service();
    let (user_id, refresh) = registered_user(&tokens, &users, "device-1").await;

    let session = tokens
        .login("buyer@example.com", "hunter2abc", "device-1")
        .await
        .unwrap();

    assert_eq!(session.refresh_token, refresh);
    assert_eq!(users.refresh_map(user_id)["device-1"], refresh);
    assert!(session.expires_at > Utc::now());
}

#[tokio::test]
async fn refresh_access_leaves_live_refresh_untouched() {
    let (tokens, users) = service();
    let (user_id, refresh) = registered_user(&tokens, &users, "device-1").await;

    let session = tokens.refresh_access(&refresh, "device-1").await.unwrap();

    // A new access credential, same stored refresh.
    assert!(tokens.authenticate(&session.access_token).is_ok());
    assert_eq!(session.refresh_token, refresh);
    assert_eq!(users.refresh_map(user_id)["device-1"], refresh);
}

#[tokio::test]
async fn expired_refresh_is_rotated_and_superseded_token_mismatches() {
    let (tokens, users) = service();
    let (user_id, _) = registered_user(&tokens, &users, "device-1").await;

    let stale = refresh_token_with_exp(&user_id.to_string(), Utc::now().timestamp() - 60);
    users.seed_refresh(user_id, "device-1", &stale);

    let session = tokens.refresh_access(&stale, "device-1").await.unwrap();
    assert_ne!(session.refresh_token, stale);
    assert_eq!(users.refresh_map(user_id)["device-1"], session.refresh_token);

    // The superseded token no longer matches the stored one.
    let err = tokens.refresh_access(&stale, "device-1").await.unwrap_err();
    assert!(matches!(err, AuthError::CredentialMismatch));
}

#[tokio::test]
async fn presented_refresh_must_match_stored() {
    let (tokens, users) = service();
    let (user_id, _) = registered_user(&tokens, &users, "device-1").await;

    let other = refresh_token_with_exp(&user_id.to_string(), Utc::now().timestamp() + 3600);
    let err = tokens.refresh_access(&other, "device-1").await.unwrap_err();
    assert!(matches!(err, AuthError::CredentialMismatch));
}

#[tokio::test]
async fn unknown_fingerprint_gets_a_fresh_session() {
    let (tokens, users) = service();
    let (user_id, refresh_one) = registered_user(&tokens, &users, "device-1").await;

    let session = tokens.refresh_access(&refresh_one, "device-2").await.unwrap();

    // A brand-new refresh token stored under the new fingerprint; the first
    // device's session is untouched.
    let map = users.refresh_map(user_id);
    assert_eq!(map["device-2"], session.refresh_token);
    assert_ne!(session.refresh_token, refresh_one);
    assert_eq!(map["device-1"], refresh_one);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let (tokens, users) = service();
    let (user_id, refresh) = registered_user(&tokens, &users, "device-1").await;

    tokens.logout(&refresh, "device-1").await.unwrap();
    assert!(users.refresh_map(user_id).is_empty());

    // Second logout for the same fingerprint is a no-op, not an error.
    tokens.logout(&refresh, "device-1").await.unwrap();
}

#[tokio::test]
async fn logout_leaves_other_devices_alone() {
    let (tokens, users) = service();
    let (user_id, refresh_one) = registered_user(&tokens, &users, "device-1").await;
    let second = tokens
        .login("buyer@example.com", "hunter2abc", "device-2")
        .await
        .unwrap();

    tokens.logout(&refresh_one, "device-1").await.unwrap();

    let map = users.refresh_map(user_id);
    assert!(!map.contains_key("device-1"));
    assert_eq!(map["device-2"], second.refresh_token);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (tokens, users) = service();
    registered_user(&tokens, &users, "device-1").await;

    let err = tokens
        .login("buyer@example.com", "wrongpass1", "device-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn unknown_account_is_rejected_as_invalid_credentials() {
    let (tokens, _) = service();
    let err = tokens
        .login("nobody@example.com", "hunter2abc", "device-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (tokens, users) = service();
    registered_user(&tokens, &users, "device-1").await;

    let err = tokens
        .register("buyer@example.com", "hunter2abc", "device-9")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailAlreadyExists));
}
