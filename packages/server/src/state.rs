use std::sync::Arc;

use review_core::ReviewService;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::repository::{SeaReviewRepository, SeaSiteDirectory};
use crate::utils::geo::PrefixCountryLookup;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub reviews: Arc<ReviewService>,
    pub countries: Arc<PrefixCountryLookup>,
}

impl AppState {
    /// Wire the review rules to PostgreSQL with the configured plan table.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let countries = Arc::new(PrefixCountryLookup::default());
        let reviews = ReviewService::new(
            Arc::new(SeaSiteDirectory::new(db.clone())),
            Arc::new(SeaReviewRepository::new(db.clone())),
            config.plans.clone(),
        )
        .with_country_lookup(countries.clone());

        Self {
            db,
            config,
            reviews: Arc::new(reviews),
            countries,
        }
    }
}
