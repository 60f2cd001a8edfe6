//! Persistence adapters for finished scenarios

mod in_memory_result_repository;
mod sqlite_result_repository;

pub use in_memory_result_repository::InMemoryGameResultRepository;
pub use sqlite_result_repository::SqliteGameResultRepository;
