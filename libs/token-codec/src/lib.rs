//! Signed session-credential codec.
//!
//! Two independent HMAC-SHA256 keys sign two token classes: short-lived
//! access tokens and long-lived refresh tokens. Validity is derived purely
//! from the signed `exp` claim, so access tokens need no server-side state.
//!
//! The expiry check is done against the claim directly rather than through
//! the library's leeway-based validation: a token is expired from the expiry
//! instant onwards, inclusive.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Refresh token lifetime.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// The class a credential was issued as. Serialized into the `class` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

/// Claim set carried by every issued credential. The claim names are the
/// closed set shared with every consumer of this crate. The `jti` claim
/// keeps two credentials issued for the same subject within the same second
/// from being byte-identical, which refresh rotation relies on.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    class: TokenClass,
    jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("credential expired")]
    Expired,

    #[error("unexpected signing method")]
    WrongSigningMethod,

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("failed to sign credential: {0}")]
    Signing(String),
}

/// A freshly signed credential together with its decoded attributes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub subject: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Encodes, decodes and verifies session credentials.
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    /// Issue a short-lived access credential for `subject`.
    pub fn issue_access(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenClass::Access, ACCESS_TOKEN_TTL_SECS)
    }

    /// Issue a long-lived refresh credential for `subject`.
    pub fn issue_refresh(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenClass::Refresh, REFRESH_TOKEN_TTL_SECS)
    }

    /// Verify signature, class and expiry; return the subject identity.
    pub fn validate(&self, token: &str, class: TokenClass) -> Result<String, TokenError> {
        let claims = self.decode_claims(token, class)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    /// Structural validation plus an expiry answer, without rejecting
    /// expired tokens. Used by the login path to decide whether a stored
    /// refresh credential can be reused.
    pub fn is_expired(&self, token: &str, class: TokenClass) -> Result<bool, TokenError> {
        let claims = self.decode_claims(token, class)?;
        Ok(claims.exp <= Utc::now().timestamp())
    }

    /// Extract the subject from a structurally valid credential, tolerating
    /// an expired `exp` claim. Refresh rotation and logout need the identity
    /// out of credentials that may already be past their lifetime.
    pub fn subject_ignoring_expiry(
        &self,
        token: &str,
        class: TokenClass,
    ) -> Result<String, TokenError> {
        Ok(self.decode_claims(token, class)?.sub)
    }

    fn issue(
        &self,
        subject: &str,
        class: TokenClass,
        ttl_secs: i64,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = Utc::now() + Duration::seconds(ttl_secs);
        let claims = Claims {
            sub: subject.to_owned(),
            exp: expires_at.timestamp(),
            class,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, self.encoding_key(class))
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            subject: subject.to_owned(),
            token,
            expires_at,
        })
    }

    fn decode_claims(&self, token: &str, class: TokenClass) -> Result<Claims, TokenError> {
        // Expiry is compared manually below the decode, so the library-side
        // exp check is disabled. The claim must still be present.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, self.decoding_key(class), &validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidAlgorithm => TokenError::WrongSigningMethod,
                _ => TokenError::Malformed(e.to_string()),
            },
        )?;

        if data.claims.class != class {
            return Err(TokenError::Malformed(format!(
                "expected {} credential, got {}",
                class.as_str(),
                data.claims.class.as_str()
            )));
        }
        Ok(data.claims)
    }

    fn encoding_key(&self, class: TokenClass) -> &EncodingKey {
        match class {
            TokenClass::Access => &self.access_encoding,
            TokenClass::Refresh => &self.refresh_encoding,
        }
    }

    fn decoding_key(&self, class: TokenClass) -> &DecodingKey {
        match class {
            TokenClass::Access => &self.access_decoding,
            TokenClass::Refresh => &self.refresh_decoding,
        }
    }
}
