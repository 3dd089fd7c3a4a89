//! Database adapters: SeaORM entities, Postgres repositories, and the
//! in-memory store used when no database is configured.

mod connections;
pub mod entity;
mod memory;
pub mod postgres_repo;

pub use connections::{DatabaseConfig, connect};
pub use memory::InMemoryStore;
pub use postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresReactionRepository,
    PostgresUserRepository,
};

#[cfg(test)]
mod tests;
