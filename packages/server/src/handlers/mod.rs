pub mod analytics;
pub mod auth;
pub mod health;
pub mod review;
pub mod site;
pub mod widget;
