//! # Fable Core
//!
//! The domain layer of the Fable blog platform.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod feed;
pub mod ports;

pub use error::DomainError;
pub use feed::{FeedItem, FeedOptions, FeedPage, FeedService};
