pub mod memory_user_repository;
pub mod sqlite_user_repository;

pub use memory_user_repository::MemoryUserStore;
pub use sqlite_user_repository::SqliteUserStore;
