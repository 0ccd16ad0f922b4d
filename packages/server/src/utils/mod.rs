pub mod geo;
pub mod hash;
pub mod jwt;
