pub mod analytics;
pub mod auth;
pub mod review;
pub mod shared;
pub mod site;
pub mod widget;
