pub mod user_repository;

pub use user_repository::{SortDirection, UserFilter, UserQuery, UserStore};

#[cfg(test)]
pub use user_repository::MockUserStore;
