mod common;
mod review;
mod widget;
