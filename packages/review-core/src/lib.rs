//! Review submission and moderation rules.
//!
//! The service talks to storage only through the traits in [`traits`], so the
//! same rules run against PostgreSQL in the server and against an in-memory
//! store in tests.

pub mod clock;
pub mod error;
pub mod models;
pub mod service;
pub mod traits;


pub use clock::{ManualClock, SystemClock};
pub use error::{ReviewError, StorageError};
pub use models::{
    NewReview, PublicReview, PublicReviews, PublicSite, ReviewFilter, ReviewOrder, ReviewRecord,
    ReviewSubmission, SiteRecord, SubmittedReview, Submitter,
};
pub use service::ReviewService;
pub use traits::{Clock, CountryLookup, ReviewRepository, SiteDirectory};
