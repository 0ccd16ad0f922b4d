use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Email
    pub uid: i32,    // User ID
    pub exp: usize,  // Expiration timestamp
    pub kind: TokenKind,
}

fn sign_with(
    user_id: i32,
    email: &str,
    kind: TokenKind,
    ttl: Duration,
    secret: &str,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("token expiry overflow"))?
        .timestamp();

    let claims = Claims {
        sub: email.to_owned(),
        uid: user_id,
        exp: expiration as usize,
        kind,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Sign a short-lived access token.
pub fn sign_access(user_id: i32, email: &str, auth: &AuthConfig) -> Result<String> {
    sign_with(
        user_id,
        email,
        TokenKind::Access,
        Duration::minutes(auth.access_token_ttl_minutes),
        &auth.jwt_secret,
    )
}

/// Sign a refresh token with the separate refresh secret.
pub fn sign_refresh(user_id: i32, email: &str, auth: &AuthConfig) -> Result<String> {
    sign_with(
        user_id,
        email,
        TokenKind::Refresh,
        Duration::days(auth.refresh_token_ttl_days),
        &auth.refresh_secret,
    )
}

fn verify_with(token: &str, secret: &str, expected: TokenKind) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.kind != expected {
        anyhow::bail!("unexpected token kind {:?}", token_data.claims.kind);
    }
    Ok(token_data.claims)
}

/// Verify and decode an access token. Refresh tokens are rejected.
pub fn verify_access(token: &str, auth: &AuthConfig) -> Result<Claims> {
    verify_with(token, &auth.jwt_secret, TokenKind::Access)
}

pub fn verify_refresh(token: &str, auth: &AuthConfig) -> Result<Claims> {
    verify_with(token, &auth.refresh_secret, TokenKind::Refresh)
}
