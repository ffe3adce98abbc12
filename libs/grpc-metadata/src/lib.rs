//! Out-of-band credential extraction from gRPC call metadata.
//!
//! Every credential-gated call carries a bearer credential under
//! `authorization` and an opaque per-device id under `fingerprint`. The key
//! names are a closed set; call sites never touch raw strings.

use thiserror::Error;
use tonic::metadata::MetadataMap;
use tonic::Status;

const BEARER_PREFIX: &str = "Bearer ";

/// The metadata keys the delivery subsystem reads. Closed enumeration so a
/// typo'd key cannot compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Authorization,
    Fingerprint,
}

impl MetadataKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::Authorization => "authorization",
            MetadataKey::Fingerprint => "fingerprint",
        }
    }
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("missing required metadata: {0}")]
    Missing(&'static str),

    #[error("metadata value for {0} is not valid ascii")]
    NotAscii(&'static str),
}

impl From<MetadataError> for Status {
    fn from(err: MetadataError) -> Self {
        Status::unauthenticated(err.to_string())
    }
}

/// Read a required metadata value. The `authorization` value has an optional
/// `Bearer ` prefix stripped before it is returned.
pub fn required_value(md: &MetadataMap, key: MetadataKey) -> Result<String, MetadataError> {
    let raw = md
        .get(key.as_str())
        .ok_or(MetadataError::Missing(key.as_str()))?
        .to_str()
        .map_err(|_| MetadataError::NotAscii(key.as_str()))?;

    let value = match key {
        MetadataKey::Authorization => raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw),
        MetadataKey::Fingerprint => raw,
    };

    if value.is_empty() {
        return Err(MetadataError::Missing(key.as_str()));
    }
    Ok(value.to_owned())
}

/// Shorthand for the bearer credential.
pub fn bearer_token(md: &MetadataMap) -> Result<String, MetadataError> {
    required_value(md, MetadataKey::Authorization)
}

/// Shorthand for the device fingerprint.
pub fn fingerprint(md: &MetadataMap) -> Result<String, MetadataError> {
    required_value(md, MetadataKey::Fingerprint)
}
