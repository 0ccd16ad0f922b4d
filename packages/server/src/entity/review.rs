use common::ReviewStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub site_id: Uuid,
    #[sea_orm(belongs_to, from = "site_id", to = "id")]
    pub site: HasOne<super::site::Entity>,

    pub author_name: String,
    pub author_email: Option<String>,
    /// 1 to 5.
    pub rating: i32,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub status: ReviewStatus,

    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
