use chrono::{DateTime, Utc};
use common::Tier;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::site;
use crate::error::AppError;
use crate::models::shared::validate_length;

/// Request body for creating a site.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSiteRequest {
    /// Site name (2-100 characters).
    #[schema(example = "Corner Bakery")]
    pub name: String,
    /// Domain (2-255 characters).
    #[schema(example = "bakery.example.com")]
    pub domain: String,
    /// Widget settings merged over the defaults.
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Value>,
}

fn validate_settings_object(settings: &serde_json::Value) -> Result<(), AppError> {
    if !settings.is_object() {
        return Err(AppError::Validation("Settings must be a JSON object".into()));
    }
    Ok(())
}

pub fn validate_create_site(payload: &CreateSiteRequest) -> Result<(), AppError> {
    validate_length(&payload.name, "Site name", 2, 100)?;
    validate_length(&payload.domain, "Domain", 2, 255)?;
    if let Some(ref settings) = payload.settings {
        validate_settings_object(settings)?;
    }
    Ok(())
}

/// Partial update of a site. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSiteRequest {
    #[schema(example = "Corner Bakery & Cafe")]
    pub name: Option<String>,
    pub domain: Option<String>,
}

pub fn validate_update_site(payload: &UpdateSiteRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_length(name, "Site name", 2, 100)?;
    }
    if let Some(ref domain) = payload.domain {
        validate_length(domain, "Domain", 2, 255)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateSettingsRequest {
    /// Keys to overwrite; other stored keys are kept.
    #[schema(value_type = Object)]
    pub settings: serde_json::Value,
}

pub fn validate_update_settings(payload: &UpdateSettingsRequest) -> Result<(), AppError> {
    validate_settings_object(&payload.settings)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteResponse {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub plan: Tier,
    pub is_active: bool,
    #[schema(value_type = Object)]
    pub settings: serde_json::Value,
    /// Reviews of any status.
    pub review_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SiteResponse {
    pub fn new(site: site::Model, review_count: u64) -> Self {
        Self {
            id: site.id,
            name: site.name,
            domain: site.domain,
            plan: site.plan,
            is_active: site.is_active,
            settings: site.settings,
            review_count,
            created_at: site.created_at,
            updated_at: site.updated_at,
        }
    }
}

/// Row of the owner's site list, with the review count computed in SQL.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct SiteListItem {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub plan: Tier,
    pub is_active: bool,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteListResponse {
    pub data: Vec<SiteListItem>,
}
