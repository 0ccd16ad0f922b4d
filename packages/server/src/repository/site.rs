use async_trait::async_trait;
use review_core::{SiteDirectory, SiteRecord, StorageError};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::site;

impl From<site::Model> for SiteRecord {
    fn from(s: site::Model) -> Self {
        Self {
            id: s.id,
            owner_id: s.user_id,
            name: s.name,
            tier: s.plan,
            is_active: s.is_active,
        }
    }
}

#[derive(Clone)]
pub struct SeaSiteDirectory {
    db: DatabaseConnection,
}

impl SeaSiteDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SiteDirectory for SeaSiteDirectory {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<SiteRecord>, StorageError> {
        let model = site::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(StorageError::new)?;
        Ok(model.map(SiteRecord::from))
    }

    async fn get_by_id_for_owner(
        &self,
        id: Uuid,
        owner_id: i32,
    ) -> Result<Option<SiteRecord>, StorageError> {
        let model = site::Entity::find_by_id(id)
            .filter(site::Column::UserId.eq(owner_id))
            .one(&self.db)
            .await
            .map_err(StorageError::new)?;
        Ok(model.map(SiteRecord::from))
    }
}
