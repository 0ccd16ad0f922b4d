use async_trait::async_trait;
use common::ReviewStatus;
use review_core::{
    NewReview, ReviewFilter, ReviewOrder, ReviewRecord, ReviewRepository, StorageError,
};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::review;

impl From<review::Model> for ReviewRecord {
    fn from(r: review::Model) -> Self {
        Self {
            id: r.id,
            site_id: r.site_id,
            author_name: r.author_name,
            author_email: r.author_email,
            rating: r.rating,
            comment: r.comment,
            status: r.status,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            country: r.country,
            created_at: r.created_at,
        }
    }
}

/// Translate a filter into a SQL condition. Every present field is an equality
/// test except `created_since`, which is an inclusive lower bound.
fn condition(filter: &ReviewFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(id) = filter.id {
        cond = cond.add(review::Column::Id.eq(id));
    }
    if let Some(site_id) = filter.site_id {
        cond = cond.add(review::Column::SiteId.eq(site_id));
    }
    if let Some(status) = filter.status {
        cond = cond.add(review::Column::Status.eq(status));
    }
    if let Some(ref ip) = filter.ip_address {
        cond = cond.add(review::Column::IpAddress.eq(ip.as_str()));
    }
    if let Some(ref email) = filter.author_email {
        cond = cond.add(review::Column::AuthorEmail.eq(email.as_str()));
    }
    if let Some(since) = filter.created_since {
        cond = cond.add(review::Column::CreatedAt.gte(since));
    }
    cond
}

#[derive(Clone)]
pub struct SeaReviewRepository {
    db: DatabaseConnection,
}

impl SeaReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewRepository for SeaReviewRepository {
    async fn count_where(&self, filter: &ReviewFilter) -> Result<u64, StorageError> {
        review::Entity::find()
            .filter(condition(filter))
            .count(&self.db)
            .await
            .map_err(StorageError::new)
    }

    async fn find_first_where(
        &self,
        filter: &ReviewFilter,
    ) -> Result<Option<ReviewRecord>, StorageError> {
        let model = review::Entity::find()
            .filter(condition(filter))
            .order_by_desc(review::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(StorageError::new)?;
        Ok(model.map(ReviewRecord::from))
    }

    async fn find_many_where(
        &self,
        filter: &ReviewFilter,
        order: ReviewOrder,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ReviewRecord>, StorageError> {
        let sort = match order {
            ReviewOrder::NewestFirst => Order::Desc,
            ReviewOrder::OldestFirst => Order::Asc,
        };
        let models = review::Entity::find()
            .filter(condition(filter))
            .order_by(review::Column::CreatedAt, sort.clone())
            .order_by(review::Column::Id, sort)
            .offset(Some(offset))
            .limit(Some(limit))
            .all(&self.db)
            .await
            .map_err(StorageError::new)?;
        Ok(models.into_iter().map(ReviewRecord::from).collect())
    }

    async fn create(&self, new: NewReview) -> Result<ReviewRecord, StorageError> {
        let model = review::ActiveModel {
            id: Set(Uuid::now_v7()),
            site_id: Set(new.site_id),
            author_name: Set(new.author_name),
            author_email: Set(new.author_email),
            rating: Set(new.rating),
            comment: Set(new.comment),
            status: Set(new.status),
            ip_address: Set(new.ip_address),
            user_agent: Set(new.user_agent),
            country: Set(new.country),
            created_at: Set(new.created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(StorageError::new)?;
        Ok(model.into())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<Option<ReviewRecord>, StorageError> {
        let Some(existing) = review::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(StorageError::new)?
        else {
            return Ok(None);
        };

        let mut active: review::ActiveModel = existing.into();
        active.status = Set(status);
        let model = active.update(&self.db).await.map_err(StorageError::new)?;
        Ok(Some(model.into()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = review::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(StorageError::new)?;
        Ok(result.rows_affected > 0)
    }
}
