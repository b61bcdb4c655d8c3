use crate::entities::{User, UserDraft, UserField, UserRole};
use crate::errors::DomainError;
use crate::repositories::{SortDirection, UserFilter, UserQuery, UserStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::error;

/// Equality filters accepted by [`UserService::list`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilters {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// Ordering and paging for [`UserService::list`]. Without `ascending` the
/// order is descending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub order_by: Option<UserField>,
    pub ascending: bool,
}

/// User Service - validates input and talks to the `users` collection
///
/// Error policy differs per operation: `create`, `update`, `delete` and
/// `list` log and return store failures, while `find_by_id` and
/// `find_by_email` log them and answer `None`, so a failed lookup looks the
/// same as a missing user. Callers rely on that split; keep it unless every
/// caller is changed with it.
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new user, returning it with the store-assigned id
    pub async fn create(&self, draft: UserDraft) -> Result<User, DomainError> {
        let user = draft.validate()?;

        match self.store.insert(&user).await {
            Ok(id) => Ok(user.with_id(id)),
            Err(e) => {
                error!(error = %e, "Error creating user");
                Err(e.into())
            }
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Option<User> {
        match self.store.get(id).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, user_id = id, "Error finding user");
                None
            }
        }
    }

    /// First user whose email equals `email` exactly
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let query = UserQuery::new().filter(UserFilter::Email(email.to_string()));

        match self.store.query(&query).await {
            Ok(users) => users.into_iter().next(),
            Err(e) => {
                error!(error = %e, "Error finding user by email");
                None
            }
        }
    }

    /// Validates only the supplied draft, not the stored record merged with
    /// it: every update must carry `email` and `username` again.
    pub async fn update(&self, id: &str, draft: UserDraft) -> Result<User, DomainError> {
        let user = UserDraft {
            updated_at: Some(Utc::now()),
            ..draft
        }
        .validate()?;

        match self.store.update(id, &user).await {
            Ok(()) => Ok(user.with_id(id)),
            Err(e) => {
                error!(error = %e, user_id = id, "Error updating user");
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.store.delete(id).await.map_err(|e| {
            error!(error = %e, user_id = id, "Error deleting user");
            e.into()
        })
    }

    /// List users with filtering and paging
    pub async fn list(
        &self,
        filters: ListFilters,
        options: ListOptions,
    ) -> Result<Vec<User>, DomainError> {
        let query = Self::build_query(&filters, &options);

        self.store.query(&query).await.map_err(|e| {
            error!(error = %e, "Error listing users");
            e.into()
        })
    }

    fn build_query(filters: &ListFilters, options: &ListOptions) -> UserQuery {
        let mut query = UserQuery::new();

        if let Some(role) = filters.role {
            query = query.filter(UserFilter::Role(role));
        }

        if let Some(is_active) = filters.is_active {
            query = query.filter(UserFilter::IsActive(is_active));
        }

        if let Some(field) = options.order_by {
            let direction = if options.ascending {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            query = query.order_by(field, direction);
        }

        // A zero limit means "no limit"
        if let Some(limit) = options.limit.filter(|&n| n > 0) {
            query = query.limit(limit);
        }

        query
    }
}
