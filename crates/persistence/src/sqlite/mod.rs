//! SQLite persistence module
//!
//! Repository pattern for SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    create_memory_pool, create_pool, create_schema, CompletionRepo, MilestoneRepo, SettingsRepo,
    TaskRepo, UserRepo, WithdrawalRepo,
};
pub use schema::{SettingsRow, TaskRow, UserRow, WithdrawalRow, SCHEMA};
