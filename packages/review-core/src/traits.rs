use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ReviewStatus;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{NewReview, ReviewFilter, ReviewOrder, ReviewRecord, SiteRecord};

/// Read access to sites.
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<SiteRecord>, StorageError>;

    /// Like [`SiteDirectory::get_by_id`] but only returns the site if `owner_id` owns it.
    async fn get_by_id_for_owner(
        &self,
        id: Uuid,
        owner_id: i32,
    ) -> Result<Option<SiteRecord>, StorageError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn count_where(&self, filter: &ReviewFilter) -> Result<u64, StorageError>;

    async fn find_first_where(
        &self,
        filter: &ReviewFilter,
    ) -> Result<Option<ReviewRecord>, StorageError>;

    async fn find_many_where(
        &self,
        filter: &ReviewFilter,
        order: ReviewOrder,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ReviewRecord>, StorageError>;

    async fn create(&self, review: NewReview) -> Result<ReviewRecord, StorageError>;

    /// Returns `None` when no review has this id.
    async fn update_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<Option<ReviewRecord>, StorageError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StorageError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Maps a submitter IP address to a country name.
pub trait CountryLookup: Send + Sync {
    fn country_for(&self, ip: &str) -> Option<String>;
}
