//! # Fable Infrastructure
//!
//! Concrete implementations of the ports defined in `fable-core`:
//! SeaORM/Postgres repositories, in-memory repositories (no-database
//! fallback and test substrate), JWT session tokens, Argon2 hashing.

pub mod auth;
pub mod database;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{DatabaseConfig, InMemoryStore, connect};
