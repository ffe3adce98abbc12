use std::collections::HashMap;
use uuid::Uuid;

/// Fingerprint -> currently valid refresh token for that device. At most one
/// live refresh token per fingerprint; logging out one device leaves the
/// others untouched.
pub type DeviceRefreshMap = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub refresh_sessions: DeviceRefreshMap,
}
