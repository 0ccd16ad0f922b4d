use common::Tier;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub name: String,
    pub domain: String,
    pub plan: Tier,
    pub is_active: bool,

    /// Widget appearance, merged over the defaults in `models::widget`.
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: serde_json::Value,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many)]
    pub widget_views: HasMany<super::widget_view::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
