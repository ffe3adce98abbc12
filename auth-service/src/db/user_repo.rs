//! User-record collaborator: account rows plus the per-device refresh map.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{DeviceRefreshMap, NewUser, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AuthResult<()>;
    async fn find_by_email(&self, email: &str) -> AuthResult<User>;
    async fn read_device_refresh_map(&self, user_id: Uuid) -> AuthResult<DeviceRefreshMap>;
    async fn persist_device_refresh_map(
        &self,
        user_id: Uuid,
        map: &DeviceRefreshMap,
    ) -> AuthResult<()>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: NewUser) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return Err(AuthError::EmailAlreadyExists);
            }
            return Err(e.into());
        }

        for (fingerprint, refresh_token) in &user.refresh_sessions {
            sqlx::query(
                "INSERT INTO refresh_sessions (user_id, fingerprint, refresh_token) \
                 VALUES ($1, $2, $3)",
            )
            .bind(user.id)
            .bind(fingerprint)
            .bind(refresh_token)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<User> {
        let row = sqlx::query("SELECT id, email, password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
        })
    }

    async fn read_device_refresh_map(&self, user_id: Uuid) -> AuthResult<DeviceRefreshMap> {
        let rows = sqlx::query(
            "SELECT fingerprint, refresh_token FROM refresh_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut map = DeviceRefreshMap::new();
        for row in rows {
            map.insert(row.try_get("fingerprint")?, row.try_get("refresh_token")?);
        }
        Ok(map)
    }

    async fn persist_device_refresh_map(
        &self,
        user_id: Uuid,
        map: &DeviceRefreshMap,
    ) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM refresh_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (fingerprint, refresh_token) in map {
            sqlx::query(
                "INSERT INTO refresh_sessions (user_id, fingerprint, refresh_token) \
                 VALUES ($1, $2, $3)",
            )
            .bind(user_id)
            .bind(fingerprint)
            .bind(refresh_token)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
