use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Months, TimeDelta, Utc};
use common::ReviewStatus;
use review_core::service::start_of_month;
use sea_orm::prelude::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::{review, site, widget_view};
use crate::models::analytics::*;
use crate::models::shared::round1;

const TOP_COUNTRIES: usize = 10;
const RECENT_ACTIVITY: usize = 20;
const TREND_MONTHS: u32 = 6;

/// Reviews per 100 views, one decimal place. Zero when there are no views.
pub fn conversion_rate(reviews: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    round1(reviews as f64 / views as f64 * 100.0)
}

/// Percentage change from `old` to `new`, one decimal place.
///
/// From zero, any growth counts as 100% and no growth as 0%.
pub fn percentage_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        return if new > 0.0 { 100.0 } else { 0.0 };
    }
    round1((new - old) / old * 100.0)
}

/// Mean of a star distribution keyed "1" to "5", one decimal place.
pub fn mean_rating(distribution: &BTreeMap<String, u64>) -> f64 {
    let (sum, count) = distribution
        .iter()
        .filter_map(|(star, n)| star.parse::<u64>().ok().map(|star| (star * n, *n)))
        .fold((0, 0), |(sum, count), (s, n)| (sum + s, count + n));
    if count == 0 {
        return 0.0;
    }
    round1(sum as f64 / count as f64)
}

/// Comparison window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Start of the previous period and start of the current one, ending at `now`.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Period::Week => (now - TimeDelta::days(14), now - TimeDelta::days(7)),
            Period::Month => (
                now.checked_sub_months(Months::new(2))
                    .unwrap_or(now - TimeDelta::days(60)),
                now.checked_sub_months(Months::new(1))
                    .unwrap_or(now - TimeDelta::days(30)),
            ),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(format!("period must be 'week' or 'month', got '{other}'")),
        }
    }
}

fn visible_statuses() -> [ReviewStatus; 2] {
    [ReviewStatus::Approved, ReviewStatus::Pending]
}

/// Bucket timestamps by `YYYY-MM`.
fn count_by_month(dates: &[DateTime<Utc>]) -> BTreeMap<String, u64> {
    let mut buckets = BTreeMap::new();
    for date in dates {
        *buckets.entry(date.format("%Y-%m").to_string()).or_insert(0) += 1;
    }
    buckets
}

fn merge_trend(
    reviews: BTreeMap<String, u64>,
    views: BTreeMap<String, u64>,
) -> Vec<MonthlyPoint> {
    let mut merged: BTreeMap<String, MonthlyPoint> = BTreeMap::new();
    for (month, count) in reviews {
        merged.insert(
            month.clone(),
            MonthlyPoint {
                month,
                reviews: count,
                views: 0,
            },
        );
    }
    for (month, count) in views {
        merged
            .entry(month.clone())
            .or_insert(MonthlyPoint {
                month,
                reviews: 0,
                views: 0,
            })
            .views = count;
    }
    merged.into_values().collect()
}

fn merge_countries(
    views: Vec<(String, i64)>,
    reviews: Vec<(String, i64)>,
    limit: usize,
) -> Vec<CountryStat> {
    let mut by_country: HashMap<String, CountryStat> = HashMap::new();
    for (country, count) in views {
        by_country
            .entry(country.clone())
            .or_insert(CountryStat {
                country,
                views: 0,
                reviews: 0,
            })
            .views = count as u64;
    }
    for (country, count) in reviews {
        by_country
            .entry(country.clone())
            .or_insert(CountryStat {
                country,
                views: 0,
                reviews: 0,
            })
            .reviews = count as u64;
    }
    let mut stats: Vec<CountryStat> = by_country.into_values().collect();
    stats.sort_by(|a, b| {
        (b.views + b.reviews)
            .cmp(&(a.views + a.reviews))
            .then_with(|| a.country.cmp(&b.country))
    });
    stats.truncate(limit);
    stats
}

/// Read-side aggregation over reviews and widget views.
pub struct AnalyticsService<'a, C: ConnectionTrait> {
    conn: &'a C,
    now: DateTime<Utc>,
}

impl<'a, C: ConnectionTrait> AnalyticsService<'a, C> {
    pub fn new(conn: &'a C, now: DateTime<Utc>) -> Self {
        Self { conn, now }
    }

    /// Record one widget render.
    pub async fn track_view(
        &self,
        site_id: Uuid,
        ip_address: String,
        user_agent: Option<String>,
        referer: Option<String>,
        country: Option<String>,
    ) -> Result<(), DbErr> {
        let view = widget_view::ActiveModel {
            id: Set(Uuid::now_v7()),
            site_id: Set(site_id),
            ip_address: Set(ip_address),
            user_agent: Set(user_agent),
            referer: Set(referer),
            country: Set(country),
            created_at: Set(self.now),
            ..Default::default()
        };
        widget_view::Entity::insert(view)
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    async fn avg_rating(&self, cond: Condition) -> Result<f64, DbErr> {
        let avg: Option<Option<f64>> = review::Entity::find()
            .select_only()
            .column_as(
                Expr::cust("CAST(AVG(\"rating\") AS DOUBLE PRECISION)"),
                "avg_rating",
            )
            .filter(cond)
            .into_tuple()
            .one(self.conn)
            .await?;
        Ok(round1(avg.flatten().unwrap_or(0.0)))
    }

    async fn count_reviews(&self, cond: Condition) -> Result<u64, DbErr> {
        review::Entity::find().filter(cond).count(self.conn).await
    }

    async fn count_views(&self, cond: Condition) -> Result<u64, DbErr> {
        widget_view::Entity::find().filter(cond).count(self.conn).await
    }

    /// Totals over every site owned by `user_id`.
    pub async fn dashboard(&self, user_id: i32) -> Result<DashboardStats, DbErr> {
        let sites: Vec<(Uuid, bool)> = site::Entity::find()
            .select_only()
            .column(site::Column::Id)
            .column(site::Column::IsActive)
            .filter(site::Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.conn)
            .await?;

        if sites.is_empty() {
            return Ok(DashboardStats {
                total_reviews: 0,
                this_month_reviews: 0,
                avg_rating: 0.0,
                total_views: 0,
                conversion_rate: 0.0,
                active_sites: 0,
            });
        }

        let site_ids: Vec<Uuid> = sites.iter().map(|(id, _)| *id).collect();
        let active_sites = sites.iter().filter(|(_, active)| *active).count() as u64;

        let visible = Condition::all()
            .add(review::Column::SiteId.is_in(site_ids.clone()))
            .add(review::Column::Status.is_in(visible_statuses()));

        let total_reviews = self.count_reviews(visible.clone()).await?;
        let this_month_reviews = self
            .count_reviews(
                visible
                    .clone()
                    .add(review::Column::CreatedAt.gte(start_of_month(self.now))),
            )
            .await?;
        let avg_rating = self
            .avg_rating(
                Condition::all()
                    .add(review::Column::SiteId.is_in(site_ids.clone()))
                    .add(review::Column::Status.eq(ReviewStatus::Approved)),
            )
            .await?;
        let total_views = self
            .count_views(Condition::all().add(widget_view::Column::SiteId.is_in(site_ids)))
            .await?;

        Ok(DashboardStats {
            total_reviews,
            this_month_reviews,
            avg_rating,
            total_views,
            conversion_rate: conversion_rate(total_reviews, total_views),
            active_sites,
        })
    }

    /// Approved review count per star, with every star from 1 to 5 present.
    pub async fn rating_distribution(&self, site_id: Uuid) -> Result<BTreeMap<String, u64>, DbErr> {
        let rows: Vec<(i32, i64)> = review::Entity::find()
            .select_only()
            .column(review::Column::Rating)
            .column_as(review::Column::Id.count(), "count")
            .filter(review::Column::SiteId.eq(site_id))
            .filter(review::Column::Status.eq(ReviewStatus::Approved))
            .group_by(review::Column::Rating)
            .into_tuple()
            .all(self.conn)
            .await?;

        let mut distribution: BTreeMap<String, u64> =
            (1..=5).map(|star: i32| (star.to_string(), 0)).collect();
        for (rating, count) in rows {
            distribution.insert(rating.to_string(), count as u64);
        }
        Ok(distribution)
    }

    async fn monthly_trend(&self, site_id: Uuid) -> Result<Vec<MonthlyPoint>, DbErr> {
        let since = self
            .now
            .checked_sub_months(Months::new(TREND_MONTHS))
            .unwrap_or(self.now - TimeDelta::days(183));

        let review_dates: Vec<DateTime<Utc>> = review::Entity::find()
            .select_only()
            .column(review::Column::CreatedAt)
            .filter(review::Column::SiteId.eq(site_id))
            .filter(review::Column::Status.is_in(visible_statuses()))
            .filter(review::Column::CreatedAt.gte(since))
            .into_tuple()
            .all(self.conn)
            .await?;
        let view_dates: Vec<DateTime<Utc>> = widget_view::Entity::find()
            .select_only()
            .column(widget_view::Column::CreatedAt)
            .filter(widget_view::Column::SiteId.eq(site_id))
            .filter(widget_view::Column::CreatedAt.gte(since))
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(merge_trend(
            count_by_month(&review_dates),
            count_by_month(&view_dates),
        ))
    }

    async fn top_countries(&self, site_id: Uuid) -> Result<Vec<CountryStat>, DbErr> {
        let views: Vec<(String, i64)> = widget_view::Entity::find()
            .select_only()
            .column(widget_view::Column::Country)
            .column_as(widget_view::Column::Id.count(), "count")
            .filter(widget_view::Column::SiteId.eq(site_id))
            .filter(widget_view::Column::Country.is_not_null())
            .group_by(widget_view::Column::Country)
            .into_tuple()
            .all(self.conn)
            .await?;
        let reviews: Vec<(String, i64)> = review::Entity::find()
            .select_only()
            .column(review::Column::Country)
            .column_as(review::Column::Id.count(), "count")
            .filter(review::Column::SiteId.eq(site_id))
            .filter(review::Column::Status.eq(ReviewStatus::Approved))
            .filter(review::Column::Country.is_not_null())
            .group_by(review::Column::Country)
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(merge_countries(views, reviews, TOP_COUNTRIES))
    }

    async fn recent_activity(&self, site_id: Uuid) -> Result<Vec<Activity>, DbErr> {
        let half = (RECENT_ACTIVITY / 2) as u64;
        let reviews = review::Entity::find()
            .filter(review::Column::SiteId.eq(site_id))
            .order_by_desc(review::Column::CreatedAt)
            .limit(half)
            .all(self.conn)
            .await?;
        let views = widget_view::Entity::find()
            .filter(widget_view::Column::SiteId.eq(site_id))
            .order_by_desc(widget_view::Column::CreatedAt)
            .limit(half)
            .all(self.conn)
            .await?;

        let mut activity: Vec<Activity> = reviews
            .into_iter()
            .map(|r| Activity::Review {
                id: r.id,
                date: r.created_at,
                author: r.author_name,
                rating: r.rating,
                status: r.status,
                country: r.country,
            })
            .chain(views.into_iter().map(|v| Activity::View {
                id: v.id,
                date: v.created_at,
                country: v.country,
                referer: v.referer,
            }))
            .collect();
        activity.sort_by_key(|a| std::cmp::Reverse(a.date()));
        activity.truncate(RECENT_ACTIVITY);
        Ok(activity)
    }

    /// Headline counts of one site.
    pub async fn site_stats(&self, site_id: Uuid) -> Result<SiteStats, DbErr> {
        let for_site = || Condition::all().add(review::Column::SiteId.eq(site_id));

        let total_reviews = self
            .count_reviews(for_site().add(review::Column::Status.ne(ReviewStatus::Deleted)))
            .await?;
        let approved_reviews = self
            .count_reviews(for_site().add(review::Column::Status.eq(ReviewStatus::Approved)))
            .await?;
        let pending_reviews = self
            .count_reviews(for_site().add(review::Column::Status.eq(ReviewStatus::Pending)))
            .await?;
        let avg_rating = self
            .avg_rating(for_site().add(review::Column::Status.eq(ReviewStatus::Approved)))
            .await?;
        let total_views = self
            .count_views(Condition::all().add(widget_view::Column::SiteId.eq(site_id)))
            .await?;

        Ok(SiteStats {
            total_reviews,
            approved_reviews,
            pending_reviews,
            total_views,
            conversion_rate: conversion_rate(total_reviews, total_views),
            avg_rating,
        })
    }

    /// Full analytics of one site. The caller checks ownership and plan.
    pub async fn site_analytics(&self, site: site::Model) -> Result<SiteAnalyticsResponse, DbErr> {
        let site_id = site.id;
        Ok(SiteAnalyticsResponse {
            stats: self.site_stats(site_id).await?,
            rating_distribution: self.rating_distribution(site_id).await?,
            monthly_trend: self.monthly_trend(site_id).await?,
            top_countries: self.top_countries(site_id).await?,
            recent_activity: self.recent_activity(site_id).await?,
            site_info: SiteInfo {
                id: site.id,
                name: site.name,
                domain: site.domain,
                plan: site.plan,
            },
        })
    }

    async fn period_stats(
        &self,
        site_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PeriodStats, DbErr> {
        let in_window = Condition::all()
            .add(review::Column::SiteId.eq(site_id))
            .add(review::Column::CreatedAt.gte(start))
            .add(review::Column::CreatedAt.lte(end));

        let reviews = self
            .count_reviews(
                in_window
                    .clone()
                    .add(review::Column::Status.is_in(visible_statuses())),
            )
            .await?;
        let views = self
            .count_views(
                Condition::all()
                    .add(widget_view::Column::SiteId.eq(site_id))
                    .add(widget_view::Column::CreatedAt.gte(start))
                    .add(widget_view::Column::CreatedAt.lte(end)),
            )
            .await?;
        let avg_rating = self
            .avg_rating(in_window.add(review::Column::Status.eq(ReviewStatus::Approved)))
            .await?;

        Ok(PeriodStats {
            reviews,
            views,
            avg_rating,
            conversion_rate: conversion_rate(reviews, views),
        })
    }

    /// Current period against the one before it.
    pub async fn comparison(
        &self,
        site_id: Uuid,
        period: Period,
    ) -> Result<ComparisonResponse, DbErr> {
        let (previous_start, current_start) = period.bounds(self.now);
        let current = self.period_stats(site_id, current_start, self.now).await?;
        let previous = self
            .period_stats(site_id, previous_start, current_start)
            .await?;

        let changes = PeriodChanges {
            reviews_change: percentage_change(previous.reviews as f64, current.reviews as f64),
            views_change: percentage_change(previous.views as f64, current.views as f64),
            conversion_change: percentage_change(
                previous.conversion_rate,
                current.conversion_rate,
            ),
            rating_change: percentage_change(previous.avg_rating, current.avg_rating),
        };

        Ok(ComparisonResponse {
            period: period.as_str().to_string(),
            current,
            previous,
            changes,
        })
    }
}
