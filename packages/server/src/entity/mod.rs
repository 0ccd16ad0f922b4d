pub mod review;
pub mod site;
pub mod user;
pub mod widget_view;
