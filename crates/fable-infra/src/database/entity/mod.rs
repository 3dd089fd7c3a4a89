//! SeaORM entities and their domain conversions.

pub mod comment;
pub mod post;
pub mod reaction;
pub mod user;
