//! SeaORM implementations of the `review-core` storage ports.

mod review;
mod site;

pub use review::SeaReviewRepository;
pub use site::SeaSiteDirectory;
