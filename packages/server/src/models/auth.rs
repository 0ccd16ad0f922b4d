use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;
use crate::models::shared::{validate_email, validate_length};

/// Request body for owner registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "owner@example.com")]
    pub email: String,
    /// Password (8-50 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Display name (2-50 characters).
    #[schema(example = "Maria Owner")]
    pub name: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    let len = payload.password.chars().count();
    if !(8..=50).contains(&len) {
        return Err(AppError::Validation(
            "Password must be 8-50 characters".into(),
        ));
    }
    validate_length(&payload.name, "Name", 2, 50)
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "owner@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public profile of an owner.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "owner@example.com")]
    pub email: String,
    #[schema(example = "Maria Owner")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

/// Returned by register and login.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// Bearer token for API calls.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Exchange at `/auth/refresh` for a new access token.
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}
