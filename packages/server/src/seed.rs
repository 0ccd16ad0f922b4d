use chrono::{TimeDelta, Utc};
use common::{ReviewStatus, Tier};
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::entity::{review, site, user, widget_view};
use crate::models::widget::{default_settings, merge_settings};
use crate::utils::hash;

async fn create_index(db: &DatabaseConnection, name: &str, stmt: &mut IndexCreateStatement) {
    let sql = stmt.if_not_exists().name(name).to_string(PostgresQueryBuilder);
    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Public listing and monthly quota:
    // WHERE site_id = ? [AND status = ?] AND created_at >= ? ORDER BY created_at
    create_index(
        db,
        "idx_review_site_created",
        Index::create()
            .table(review::Entity)
            .col(review::Column::SiteId)
            .col(review::Column::CreatedAt),
    )
    .await;

    // Duplicate guard: WHERE site_id = ? AND ip_address = ? AND author_email = ?
    create_index(
        db,
        "idx_review_site_submitter",
        Index::create()
            .table(review::Entity)
            .col(review::Column::SiteId)
            .col(review::Column::IpAddress)
            .col(review::Column::AuthorEmail),
    )
    .await;

    create_index(
        db,
        "idx_widget_view_site_created",
        Index::create()
            .table(widget_view::Entity)
            .col(widget_view::Column::SiteId)
            .col(widget_view::Column::CreatedAt),
    )
    .await;

    Ok(())
}

const DEMO_PASSWORD: &str = "password123";

struct DemoReview {
    author: &'static str,
    email: &'static str,
    rating: i32,
    comment: &'static str,
    status: ReviewStatus,
    ip: &'static str,
    country: &'static str,
}

const PIZZERIA_REVIEWS: &[DemoReview] = &[
    DemoReview {
        author: "Maria Garcia",
        email: "maria@example.com",
        rating: 5,
        comment: "Amazing Margherita pizza! The crust was perfect and ingredients fresh.",
        status: ReviewStatus::Approved,
        ip: "192.168.1.101",
        country: "Ukraine",
    },
    DemoReview {
        author: "Anna Kovalenko",
        email: "anna@example.com",
        rating: 4,
        comment: "Fast delivery and hot food. The Diablo is spicy but delicious.",
        status: ReviewStatus::Approved,
        ip: "192.168.1.102",
        country: "Ukraine",
    },
];

const STORE_REVIEWS: &[DemoReview] = &[
    DemoReview {
        author: "Emma Wilson",
        email: "emma@example.com",
        rating: 5,
        comment: "Love the quality of the jeans I ordered. Fit perfectly and arrived quickly.",
        status: ReviewStatus::Approved,
        ip: "10.0.0.15",
        country: "Poland",
    },
    DemoReview {
        author: "Michael Brown",
        email: "michael@example.com",
        rating: 4,
        comment: "Had an issue with sizing and they resolved it immediately.",
        status: ReviewStatus::Pending,
        ip: "10.0.0.16",
        country: "Poland",
    },
];

const BARBER_REVIEWS: &[DemoReview] = &[
    DemoReview {
        author: "David Kim",
        email: "david@example.com",
        rating: 5,
        comment: "Best haircut I've had in years! Professional service, clean environment.",
        status: ReviewStatus::Approved,
        ip: "172.16.0.20",
        country: "Spain",
    },
    DemoReview {
        author: "James Rodriguez",
        email: "james@example.com",
        rating: 4,
        comment: "Great atmosphere and skilled barbers. Booking online was easy.",
        status: ReviewStatus::Approved,
        ip: "172.16.0.21",
        country: "Spain",
    },
];

async fn insert_owner<C: ConnectionTrait>(
    db: &C,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        email: Set(email.to_string()),
        password: Set(password_hash.to_string()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

async fn insert_site<C: ConnectionTrait>(
    db: &C,
    owner: &user::Model,
    name: &str,
    domain: &str,
    plan: Tier,
    settings: serde_json::Value,
    reviews: &[DemoReview],
) -> Result<(), DbErr> {
    let now = Utc::now();
    let site = site::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(owner.id),
        name: Set(name.to_string()),
        domain: Set(domain.to_string()),
        plan: Set(plan),
        is_active: Set(true),
        settings: Set(merge_settings(&default_settings(), &settings)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (days_ago, r) in (1..).zip(reviews) {
        review::ActiveModel {
            id: Set(Uuid::now_v7()),
            site_id: Set(site.id),
            author_name: Set(r.author.to_string()),
            author_email: Set(Some(r.email.to_string())),
            rating: Set(r.rating),
            comment: Set(r.comment.to_string()),
            status: Set(r.status),
            ip_address: Set(Some(r.ip.to_string())),
            user_agent: Set(Some("Mozilla/5.0 (demo)".to_string())),
            country: Set(Some(r.country.to_string())),
            created_at: Set(now - TimeDelta::days(days_ago)),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Insert a FREE and a PREMIUM demo owner with sites and reviews.
///
/// Skipped when the FREE demo owner already exists.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let exists = user::Entity::find()
        .filter(user::Column::Email.eq("test@example.com"))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(());
    }

    let password_hash = hash::hash_password(DEMO_PASSWORD)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {}", e)))?;

    let txn = db.begin().await?;

    let free = insert_owner(&txn, "test@example.com", "John Smith", &password_hash).await?;
    insert_site(
        &txn,
        &free,
        "Mama Mia Pizzeria",
        "mama-mia-pizza.com",
        Tier::Free,
        json!({"primaryColor": "#e74c3c"}),
        PIZZERIA_REVIEWS,
    )
    .await?;

    let premium =
        insert_owner(&txn, "premium@example.com", "Sarah Johnson", &password_hash).await?;
    insert_site(
        &txn,
        &premium,
        "Fashion Store",
        "fashion-store.com",
        Tier::Premium,
        json!({"theme": "dark", "primaryColor": "#8e44ad", "layout": "list"}),
        STORE_REVIEWS,
    )
    .await?;
    insert_site(
        &txn,
        &premium,
        "City Barber Shop",
        "city-barber.com",
        Tier::Premium,
        json!({"primaryColor": "#2c3e50"}),
        BARBER_REVIEWS,
    )
    .await?;

    txn.commit().await?;
    info!("Seeded demo owners test@example.com and premium@example.com");

    Ok(())
}
