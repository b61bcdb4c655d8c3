use async_trait::async_trait;
use domain::{SortDirection, StoreError, User, UserField, UserQuery, UserStore};
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local users collection.
///
/// Keeps documents in insertion order, which is the order unordered queries
/// return. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_value(user: &User, field: UserField) -> bool {
    match field {
        UserField::FirstName => user.first_name.is_some(),
        UserField::LastName => user.last_name.is_some(),
        UserField::ProfileImageUrl => user.profile_image_url.is_some(),
        UserField::LastLogin => user.last_login.is_some(),
        UserField::CreatedAt => user.created_at.is_some(),
        UserField::UpdatedAt => user.updated_at.is_some(),
        UserField::Id
        | UserField::Email
        | UserField::Username
        | UserField::Role
        | UserField::IsActive => true,
    }
}

fn compare(a: &User, b: &User, field: UserField) -> Ordering {
    match field {
        UserField::Id => a.id.cmp(&b.id),
        UserField::Email => a.email.cmp(&b.email),
        UserField::Username => a.username.cmp(&b.username),
        UserField::FirstName => a.first_name.cmp(&b.first_name),
        UserField::LastName => a.last_name.cmp(&b.last_name),
        UserField::Role => a.role.as_str().cmp(b.role.as_str()),
        UserField::ProfileImageUrl => a.profile_image_url.cmp(&b.profile_image_url),
        UserField::IsActive => a.is_active.cmp(&b.is_active),
        UserField::LastLogin => a.last_login.cmp(&b.last_login),
        UserField::CreatedAt => a.created_at.cmp(&b.created_at),
        UserField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

/// Required fields overwrite; optional fields only when present
fn merge(stored: &mut User, changes: &User) {
    stored.email = changes.email.clone();
    stored.username = changes.username.clone();
    stored.role = changes.role;
    stored.is_active = changes.is_active;

    if changes.first_name.is_some() {
        stored.first_name = changes.first_name.clone();
    }
    if changes.last_name.is_some() {
        stored.last_name = changes.last_name.clone();
    }
    if changes.profile_image_url.is_some() {
        stored.profile_image_url = changes.profile_image_url.clone();
    }
    if changes.last_login.is_some() {
        stored.last_login = changes.last_login;
    }
    if changes.created_at.is_some() {
        stored.created_at = changes.created_at;
    }
    if changes.updated_at.is_some() {
        stored.updated_at = changes.updated_at;
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.users.write().await.push(user.clone().with_id(id.clone()));
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id.as_deref() == Some(id)).cloned())
    }

    async fn query(&self, query: &UserQuery) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut matched: Vec<User> = users.iter().filter(|u| query.matches(u)).cloned().collect();

        if let Some((field, direction)) = query.order_by {
            matched.retain(|u| has_value(u, field));
            matched.sort_by(|a, b| match direction {
                SortDirection::Ascending => compare(a, b, field),
                SortDirection::Descending => compare(b, a, field),
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn update(&self, id: &str, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let stored = users
            .iter_mut()
            .find(|u| u.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        merge(stored, user);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.users.write().await.retain(|u| u.id.as_deref() != Some(id));
        Ok(())
    }
}
