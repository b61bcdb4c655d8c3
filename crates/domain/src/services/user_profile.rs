use crate::entities::{User, UserDraft};
use crate::errors::DomainError;
use crate::services::user_service::{ListFilters, ListOptions, UserService};
use chrono::Utc;
use std::sync::Arc;

/// One user record bound to the service that persists users.
///
/// Holds the record and delegates storage to [`UserService`]; the only
/// logic of its own is formatting.
#[derive(Clone)]
pub struct UserProfile {
    data: User,
    users: Arc<UserService>,
}

impl UserProfile {
    pub fn new(data: User, users: Arc<UserService>) -> Self {
        Self { data, users }
    }

    pub fn data(&self) -> &User {
        &self.data
    }

    pub fn into_inner(self) -> User {
        self.data
    }

    /// The bound record ready for storage: `createdAt` is filled in when
    /// missing and `updatedAt` is set to now.
    pub fn serialize(&self) -> User {
        let now = Utc::now();
        User {
            created_at: Some(self.data.created_at.unwrap_or(now)),
            updated_at: Some(now),
            ..self.data.clone()
        }
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.data.first_name.as_deref().unwrap_or(""),
            self.data.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    pub async fn create(&self, draft: UserDraft) -> Result<User, DomainError> {
        self.users.create(draft).await
    }

    pub async fn find_by_id(&self, id: &str) -> Option<User> {
        self.users.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.find_by_email(email).await
    }

    pub async fn update(&self, id: &str, draft: UserDraft) -> Result<User, DomainError> {
        self.users.update(id, draft).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.users.delete(id).await
    }

    pub async fn list(
        &self,
        filters: ListFilters,
        options: ListOptions,
    ) -> Result<Vec<User>, DomainError> {
        self.users.list(filters, options).await
    }
}
