pub mod user_profile;
pub mod user_service;

pub use user_profile::UserProfile;
pub use user_service::{ListFilters, ListOptions, UserService};
