use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ceg_common::Secret;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::*;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use crate::tokens::payload::{SignedToken, TokenClaims};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("The token is malformed or has no signature.")]
    InvalidToken,
    #[error("The token signature does not match its contents.")]
    SignatureMismatch,
    #[error("The token has expired.")]
    TokenExpired,
    #[error("The token signing key is not usable. {0}")]
    InvalidKey(String),
    #[error("Could not serialize the token. {0}")]
    Serialization(String),
}

/// Signs and verifies link tokens with a process-wide HMAC-SHA-256 key.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenSigner(****)")
    }
}

impl TokenSigner {
    pub fn new(secret: &Secret<String>) -> Result<Self, TokenError> {
        if secret.is_unset() {
            return Err(TokenError::InvalidKey("The signing secret is empty".into()));
        }
        let mac = HmacSha256::new_from_slice(secret.reveal().as_bytes())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    fn mac_for(&self, claims: &TokenClaims) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(claims.canonical_string().as_bytes());
        mac
    }

    pub fn signature(&self, claims: &TokenClaims) -> String {
        hex::encode(self.mac_for(claims).finalize().into_bytes())
    }

    pub fn sign(&self, claims: TokenClaims) -> SignedToken {
        let sig = self.signature(&claims);
        SignedToken { claims, sig }
    }

    /// Checks a decoded token. Structure and signature are checked before expiry, so a tampered token reports
    /// [`TokenError::SignatureMismatch`] even if it is also stale.
    pub fn verify(&self, data: &Value, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let mut fields = data.as_object().cloned().ok_or(TokenError::InvalidToken)?;
        let sig = match fields.remove("sig") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Err(TokenError::InvalidToken),
        };
        let claims = serde_json::from_value::<TokenClaims>(Value::Object(fields)).map_err(|e| {
            debug!("🎟️ Token claims could not be parsed. {e}");
            TokenError::InvalidToken
        })?;
        let sig_bytes = hex::decode(&sig).map_err(|_| TokenError::SignatureMismatch)?;
        self.mac_for(&claims).verify_slice(&sig_bytes).map_err(|_| {
            warn!("🎟️ Signature mismatch on {} token for order {}", claims.kind(), claims.order_id());
            TokenError::SignatureMismatch
        })?;
        if claims.is_expired_at(now) {
            trace!("🎟️ {} token for order {} expired at {}", claims.kind(), claims.order_id(), claims.expiry());
            return Err(TokenError::TokenExpired);
        }
        Ok(claims)
    }

    /// Decodes and verifies an encoded token in one step.
    pub fn verify_encoded(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = decode(token).ok_or(TokenError::InvalidToken)?;
        self.verify(&data, now)
    }
}

/// URL-safe text form of a signed token.
pub fn encode(token: &SignedToken) -> Result<String, TokenError> {
    let json = token.to_json().map_err(|e| TokenError::Serialization(e.to_string()))?;
    let bytes = serde_json::to_vec(&json).map_err(|e| TokenError::Serialization(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Reverses [`encode`]. Returns `None` for anything that is not base64-wrapped JSON; no checks beyond that are made.
pub fn decode(token: &str) -> Option<Value> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim().trim_end_matches('=')).ok()?;
    serde_json::from_slice::<Value>(&bytes).ok()
}
