//! Narthex storage crate - SQLite persistence for the resource directory.
//!
//! Provides a WAL-mode SQLite database with migrations, the resource
//! repository, and the search executor that turns structured search
//! arguments into a filtered, ordered store query.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod search;

pub use db::Database;
pub use repository::ResourceRepository;
pub use search::SearchExecutor;
