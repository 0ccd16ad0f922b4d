use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One render of a site's widget page.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "widget_view")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub site_id: Uuid,
    #[sea_orm(belongs_to, from = "site_id", to = "id")]
    pub site: HasOne<super::site::Entity>,

    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
