pub mod plan;
pub mod review_status;

pub use plan::{InvalidTier, PlanLimits, PlanPolicy, Tier};
pub use review_status::ReviewStatus;
