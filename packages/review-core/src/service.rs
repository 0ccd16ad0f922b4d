use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveTime, TimeDelta, Utc};
use common::{PlanPolicy, ReviewStatus};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::clock::SystemClock;
use crate::error::ReviewError;
use crate::models::{
    NewReview, PublicReview, PublicReviews, PublicSite, ReviewFilter, ReviewOrder, ReviewRecord,
    ReviewSubmission, SiteRecord, SubmittedReview, Submitter,
};
use crate::traits::{Clock, CountryLookup, ReviewRepository, SiteDirectory};

/// Trailing window in which a repeated IP + email pair is rejected.
pub const DUPLICATE_WINDOW_HOURS: i64 = 24;

/// Upper bound on reviews returned by the public listing.
pub const PUBLIC_REVIEW_LIMIT: u64 = 50;

/// First instant of the calendar month containing `now`, in UTC.
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = now.date_naive() - Days::new(u64::from(now.day0()));
    first.and_time(NaiveTime::MIN).and_utc()
}

/// Submission, moderation, and public listing rules for reviews.
pub struct ReviewService {
    sites: Arc<dyn SiteDirectory>,
    reviews: Arc<dyn ReviewRepository>,
    clock: Arc<dyn Clock>,
    countries: Option<Arc<dyn CountryLookup>>,
    plans: PlanPolicy,
}

impl ReviewService {
    pub fn new(
        sites: Arc<dyn SiteDirectory>,
        reviews: Arc<dyn ReviewRepository>,
        plans: PlanPolicy,
    ) -> Self {
        Self {
            sites,
            reviews,
            clock: Arc::new(SystemClock),
            countries: None,
            plans,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_country_lookup(mut self, countries: Arc<dyn CountryLookup>) -> Self {
        self.countries = Some(countries);
        self
    }

    pub fn plans(&self) -> &PlanPolicy {
        &self.plans
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Accept a review from a visitor.
    ///
    /// The duplicate and quota guards read before the insert without a lock,
    /// so two concurrent submissions may both pass.
    #[instrument(skip(self, submission, submitter), fields(site_id = %site_id))]
    pub async fn submit(
        &self,
        site_id: Uuid,
        submission: ReviewSubmission,
        submitter: Submitter,
    ) -> Result<SubmittedReview, ReviewError> {
        let site = self
            .sites
            .get_by_id(site_id)
            .await?
            .ok_or(ReviewError::SiteNotFound)?;
        let limits = self.plans.limits_for(site.tier)?;
        let now = self.clock.now();

        if let (Some(ip), Some(email)) = (
            submitter.ip_address.as_deref(),
            submission.author_email.as_deref(),
        ) {
            let since = now - TimeDelta::hours(DUPLICATE_WINDOW_HOURS);
            let filter = ReviewFilter::for_site(site_id)
                .with_submitter(ip, email)
                .created_since(since);
            if self.reviews.find_first_where(&filter).await?.is_some() {
                debug!(ip, "Rejected duplicate submission");
                return Err(ReviewError::DuplicateSubmission);
            }
        }

        if let Some(limit) = limits.max_reviews_per_month {
            let filter = ReviewFilter::for_site(site_id).created_since(start_of_month(now));
            let count = self.reviews.count_where(&filter).await?;
            if limits.is_quota_reached(count) {
                info!(count, limit, tier = %site.tier, "Monthly review quota reached");
                return Err(ReviewError::QuotaExceeded { limit });
            }
        }

        let status = if limits.moderation_required {
            ReviewStatus::Pending
        } else {
            ReviewStatus::Approved
        };

        let country = match (&self.countries, submitter.ip_address.as_deref()) {
            (Some(lookup), Some(ip)) => lookup.country_for(ip),
            _ => None,
        };

        let record = self
            .reviews
            .create(NewReview {
                site_id,
                author_name: submission.author_name,
                author_email: submission.author_email,
                rating: submission.rating,
                comment: submission.comment,
                status,
                ip_address: submitter.ip_address,
                user_agent: submitter.user_agent,
                country,
                created_at: now,
            })
            .await?;

        info!(review_id = %record.id, status = %record.status, "Review submitted");
        Ok(record.into())
    }

    /// Approved reviews of a site, newest first.
    #[instrument(skip(self), fields(site_id = %site_id))]
    pub async fn public_reviews_for(&self, site_id: Uuid) -> Result<PublicReviews, ReviewError> {
        let site = self
            .sites
            .get_by_id(site_id)
            .await?
            .ok_or(ReviewError::SiteNotFound)?;

        let filter = ReviewFilter::for_site(site_id).with_status(ReviewStatus::Approved);
        let reviews: Vec<PublicReview> = self
            .reviews
            .find_many_where(&filter, ReviewOrder::NewestFirst, PUBLIC_REVIEW_LIMIT, 0)
            .await?
            .into_iter()
            .map(PublicReview::from)
            .collect();

        Ok(PublicReviews {
            site: PublicSite {
                id: site.id,
                name: site.name,
            },
            total: reviews.len(),
            reviews,
        })
    }

    /// Move a review to any status. Owner only, and only on tiers with moderation.
    #[instrument(skip(self), fields(review_id = %review_id, user_id = acting_user_id))]
    pub async fn set_status(
        &self,
        review_id: Uuid,
        acting_user_id: i32,
        status: ReviewStatus,
    ) -> Result<ReviewRecord, ReviewError> {
        let (_, site) = self.load_owned(review_id, acting_user_id).await?;

        if !self.plans.limits_for(site.tier)?.moderation_required {
            return Err(ReviewError::ModerationNotAvailable);
        }

        let updated = self
            .reviews
            .update_status(review_id, status)
            .await?
            .ok_or(ReviewError::ReviewNotFound)?;

        info!(status = %updated.status, "Review status changed");
        Ok(updated)
    }

    /// Remove a review permanently. Owner only, on any tier.
    #[instrument(skip(self), fields(review_id = %review_id, user_id = acting_user_id))]
    pub async fn delete(&self, review_id: Uuid, acting_user_id: i32) -> Result<(), ReviewError> {
        self.load_owned(review_id, acting_user_id).await?;

        if !self.reviews.delete(review_id).await? {
            return Err(ReviewError::ReviewNotFound);
        }

        info!("Review deleted");
        Ok(())
    }

    async fn load_owned(
        &self,
        review_id: Uuid,
        acting_user_id: i32,
    ) -> Result<(ReviewRecord, SiteRecord), ReviewError> {
        let review = self
            .reviews
            .find_first_where(&ReviewFilter::by_id(review_id))
            .await?
            .ok_or(ReviewError::ReviewNotFound)?;

        // A review whose site is gone is treated as missing.
        let site = self
            .sites
            .get_by_id(review.site_id)
            .await?
            .ok_or(ReviewError::ReviewNotFound)?;

        if site.owner_id != acting_user_id {
            return Err(ReviewError::AccessDenied);
        }

        Ok((review, site))
    }
}
