use crate::entities::{User, UserField, UserRole};
use crate::errors::StoreError;
use async_trait::async_trait;

/// Equality constraint on a single user attribute
#[derive(Debug, Clone, PartialEq)]
pub enum UserFilter {
    Email(String),
    Role(UserRole),
    IsActive(bool),
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::Email(email) => user.email == *email,
            UserFilter::Role(role) => user.role == *role,
            UserFilter::IsActive(active) => user.is_active == *active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Query over the `users` collection: equality filters, at most one
/// ordering field and an optional result cap.
///
/// Ordering by a field only returns records that have a value for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    pub filters: Vec<UserFilter>,
    pub order_by: Option<(UserField, SortDirection)>,
    pub limit: Option<usize>,
}

impl UserQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: UserFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: UserField, direction: SortDirection) -> Self {
        self.order_by = Some((field, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        self.filters.iter().all(|filter| filter.matches(user))
    }
}

/// Document collection holding users - what the domain needs from persistence.
/// This is a PORT in hexagonal architecture; adapters live in `infrastructure`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new document and return the id the store assigned to it.
    async fn insert(&self, user: &User) -> Result<String, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Every returned record has its `id` set.
    async fn query(&self, query: &UserQuery) -> Result<Vec<User>, StoreError>;

    /// Merge `user` into an existing document. Optional fields that are
    /// `None` leave the stored value untouched. Fails with
    /// [`StoreError::NotFound`] when no document has this id.
    async fn update(&self, id: &str, user: &User) -> Result<(), StoreError>;

    /// Deleting an id that does not exist is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
