pub mod cli;
pub mod config;
pub mod database;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod store;
pub mod utils;
pub mod web;

pub use config::Config;
pub use database::Database;
pub use memory::InMemoryStore;
pub use models::Todo;
pub use store::{StoreError, TodoStore};
pub use utils::Profile;
