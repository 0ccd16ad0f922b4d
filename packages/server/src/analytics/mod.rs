mod service;

pub use service::{AnalyticsService, Period, conversion_rate, mean_rating, percentage_change};
