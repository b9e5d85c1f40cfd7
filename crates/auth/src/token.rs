//! Compact signed tokens (JWT-shaped, HMAC-SHA256).
//!
//! Wire format: `b64url(header) "." b64url(payload) "." b64url(hmac)`.
//! Verification needs only the shared secret: no store, no IO.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

use crate::claims::{Claims, stamp_issued_at};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_TYPE: &str = "JWT";
pub const ALG_HS256: &str = "HS256";
pub const ALG_NONE: &str = "none";

/// Encodes unpadded; decodes with or without padding.
const B64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,

    #[error("invalid signing key")]
    InvalidKey,

    #[error("failed to encode token segment: {0}")]
    Encode(String),
}

/// First token segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            typ: Some(TOKEN_TYPE.to_string()),
            alg: Some(ALG_HS256.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCodecConfig {
    /// Accept tokens whose header declares `alg: "none"` without checking
    /// the signature. Off unless explicitly enabled.
    pub allow_unsigned: bool,
}

/// Why a token was rejected. Only ever logged; callers see `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Malformed,
    Unsigned,
    BadSignature,
}

/// Issues and verifies signed tokens with one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    config: TokenCodecConfig,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        Self::with_config(secret, TokenCodecConfig::default())
    }

    pub fn with_config(
        secret: impl AsRef<[u8]>,
        config: TokenCodecConfig,
    ) -> Result<Self, TokenError> {
        let mac =
            HmacSha256::new_from_slice(secret.as_ref()).map_err(|_| TokenError::InvalidKey)?;
        if config.allow_unsigned {
            warn!("unsigned tokens (alg=none) will be accepted without signature checks");
        }
        Ok(Self { mac, config })
    }

    pub fn config(&self) -> TokenCodecConfig {
        self.config
    }

    /// One-shot issue with an explicit secret.
    pub fn issue_with_secret(
        claims: &Claims,
        secret: impl AsRef<[u8]>,
    ) -> Result<String, TokenError> {
        Self::new(secret)?.issue(claims)
    }

    /// Build an HS256 token for `claims`.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = encode_json(&TokenHeader::hs256())?;
        let payload = encode_json(claims)?;
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&header, &payload));
        Ok(format!("{header}.{payload}.{signature}"))
    }

    /// Decode and check a token.
    ///
    /// Every failure (structure, JSON, signature) collapses to `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match self.check(token) {
            Ok(claims) => Some(claims),
            Err(reason) => {
                debug!(?reason, "token rejected");
                None
            }
        }
    }

    /// Re-issue a valid token with a fresh issued-at claim.
    pub fn refresh(&self, token: &str) -> Result<String, TokenError> {
        self.refresh_at(token, Utc::now())
    }

    pub fn refresh_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let mut claims = self.verify(token).ok_or(TokenError::InvalidToken)?;
        stamp_issued_at(&mut claims, now);
        self.issue(&claims)
    }

    fn check(&self, token: &str) -> Result<Claims, Rejection> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Rejection::Malformed);
        };

        let header: TokenHeader = decode_json(header_b64).ok_or(Rejection::Malformed)?;
        let claims: Claims = decode_json(payload_b64).ok_or(Rejection::Malformed)?;

        if header.alg.as_deref() == Some(ALG_NONE) {
            return if self.config.allow_unsigned {
                Ok(claims)
            } else {
                Err(Rejection::Unsigned)
            };
        }

        // Strict decode: only the canonical unpadded encoding is accepted.
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| Rejection::BadSignature)?;

        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature).map_err(|_| Rejection::BadSignature)?;

        Ok(claims)
    }

    fn sign(&self, header_b64: &str, payload_b64: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encode(e.to_string()))?;
    Ok(B64URL.encode(json))
}

fn decode_json<T: DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = B64URL.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}
