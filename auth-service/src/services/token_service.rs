//! Token lifecycle per (user, device fingerprint) pair: issue,
//! reuse-or-rotate, revoke. Access tokens are stateless; the device refresh
//! map is the only server-side credential state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use token_codec::{TokenClass, TokenCodec};

use crate::db::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::models::{DeviceRefreshMap, NewUser};
use crate::security;

/// A usable credential pair: the access token, the currently valid refresh
/// token for the device, and the access expiry instant.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserRepository>,
}

impl TokenService {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserRepository>) -> Self {
        Self { codec, users }
    }

    /// Create an account and its first device session.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        fingerprint: &str,
    ) -> AuthResult<SessionTokens> {
        let password_hash = security::hash_password(password)?;
        let user_id = Uuid::new_v4();

        let access = self.codec.issue_access(&user_id.to_string())?;
        let refresh = self.codec.issue_refresh(&user_id.to_string())?;

        let mut refresh_sessions = DeviceRefreshMap::new();
        refresh_sessions.insert(fingerprint.to_owned(), refresh.token.clone());

        self.users
            .create_user(NewUser {
                id: user_id,
                email: email.to_owned(),
                password_hash,
                refresh_sessions,
            })
            .await?;

        Ok(SessionTokens {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_at: access.expires_at,
        })
    }

    /// Password login. Always issues a fresh access token; the device's
    /// stored refresh token is reused while it remains valid and replaced
    /// otherwise. Other devices' sessions are untouched.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        fingerprint: &str,
    ) -> AuthResult<SessionTokens> {
        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            // Do not reveal whether the account exists.
            Err(AuthError::UserNotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        security::verify_password(password, &user.password_hash)?;

        let subject = user.id.to_string();
        let access = self.codec.issue_access(&subject)?;
        let mut map = self.users.read_device_refresh_map(user.id).await?;

        if let Some(stored) = map.get(fingerprint) {
            match self.codec.is_expired(stored, TokenClass::Refresh) {
                Ok(false) => {
                    debug!(user = %user.id, "reusing live refresh token for device");
                    return Ok(SessionTokens {
                        access_token: access.token,
                        refresh_token: stored.clone(),
                        expires_at: access.expires_at,
                    });
                }
                Ok(true) => {}
                Err(e) => {
                    // Undecodable stored token: replace it below.
                    warn!(user = %user.id, error = %e, "stored refresh token is unreadable");
                }
            }
        }

        let refresh = self.codec.issue_refresh(&subject)?;
        map.insert(fingerprint.to_owned(), refresh.token.clone());
        self.users.persist_device_refresh_map(user.id, &map).await?;

        Ok(SessionTokens {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_at: access.expires_at,
        })
    }

    /// Mint a new access token against the device's refresh session.
    ///
    /// When the device has a stored refresh token it must equal the
    /// presented one. A live stored token is left untouched; an expired or
    /// absent one is rotated in place and the replacement returned, after
    /// which the superseded token mismatches.
    pub async fn refresh_access(
        &self,
        presented_refresh: &str,
        fingerprint: &str,
    ) -> AuthResult<SessionTokens> {
        let subject = self
            .codec
            .subject_ignoring_expiry(presented_refresh, TokenClass::Refresh)?;
        let user_id = parse_subject(&subject)?;

        let mut map = self.users.read_device_refresh_map(user_id).await?;
        let reusable = match map.get(fingerprint) {
            Some(stored) if stored != presented_refresh => {
                return Err(AuthError::CredentialMismatch);
            }
            Some(stored) => !self.codec.is_expired(stored, TokenClass::Refresh)?,
            None => false,
        };

        let refresh_token = if reusable {
            presented_refresh.to_owned()
        } else {
            let refresh = self.codec.issue_refresh(&subject)?;
            map.insert(fingerprint.to_owned(), refresh.token.clone());
            self.users.persist_device_refresh_map(user_id, &map).await?;
            debug!(user = %user_id, "rotated refresh token for device");
            refresh.token
        };

        let access = self.codec.issue_access(&subject)?;
        Ok(SessionTokens {
            access_token: access.token,
            refresh_token,
            expires_at: access.expires_at,
        })
    }

    /// Revoke the device's refresh session. Idempotent: a second call for
    /// the same fingerprint is a no-op.
    pub async fn logout(&self, presented_refresh: &str, fingerprint: &str) -> AuthResult<()> {
        let subject = self
            .codec
            .subject_ignoring_expiry(presented_refresh, TokenClass::Refresh)?;
        let user_id = parse_subject(&subject)?;

        let mut map = self.users.read_device_refresh_map(user_id).await?;
        if map.remove(fingerprint).is_some() {
            self.users.persist_device_refresh_map(user_id, &map).await?;
        }
        Ok(())
    }

    /// Validate an access token and return the caller identity.
    pub fn authenticate(&self, access_token: &str) -> AuthResult<String> {
        Ok(self.codec.validate(access_token, TokenClass::Access)?)
    }
}

fn parse_subject(subject: &str) -> AuthResult<Uuid> {
    Uuid::parse_str(subject)
        .map_err(|_| AuthError::Validation("token subject is not a valid user id".into()))
}
