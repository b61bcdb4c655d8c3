use crate::database::{users, SqlitePool};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use domain::{
    SortDirection, StoreError, User, UserField, UserFilter, UserQuery, UserRole, UserStore,
};
use tracing::debug;
use uuid::Uuid;

// Database model - separate from domain entity.
// Field order must follow the `users` table for boxed loads.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct UserModel {
    id: String,
    email: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    profile_image_url: Option<String>,
    is_active: bool,
    last_login: Option<NaiveDateTime>,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUserModel {
    id: String,
    email: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    profile_image_url: Option<String>,
    is_active: bool,
    last_login: Option<NaiveDateTime>,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

// `None` fields are skipped by diesel, which gives merge semantics on update
#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct UserChangeset {
    email: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    profile_image_url: Option<String>,
    is_active: bool,
    last_login: Option<NaiveDateTime>,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

// Convert between domain and database models
impl TryFrom<UserModel> for User {
    type Error = StoreError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        let role = model
            .role
            .parse::<UserRole>()
            .map_err(|_| StoreError::Backend(format!("user {} has unknown role {}", model.id, model.role)))?;

        Ok(User {
            id: Some(model.id),
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            role,
            profile_image_url: model.profile_image_url,
            is_active: model.is_active,
            last_login: model.last_login.map(|t| t.and_utc()),
            created_at: model.created_at.map(|t| t.and_utc()),
            updated_at: model.updated_at.map(|t| t.and_utc()),
        })
    }
}

impl NewUserModel {
    fn new(id: String, user: &User) -> Self {
        Self {
            id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role.to_string(),
            profile_image_url: user.profile_image_url.clone(),
            is_active: user.is_active,
            last_login: user.last_login.map(|t| t.naive_utc()),
            created_at: user.created_at.map(|t| t.naive_utc()),
            updated_at: user.updated_at.map(|t| t.naive_utc()),
        }
    }
}

impl From<&User> for UserChangeset {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role.to_string(),
            profile_image_url: user.profile_image_url.clone(),
            is_active: user.is_active,
            last_login: user.last_login.map(|t| t.naive_utc()),
            created_at: user.created_at.map(|t| t.naive_utc()),
            updated_at: user.updated_at.map(|t| t.naive_utc()),
        }
    }
}

type BoxedUsers = users::BoxedQuery<'static, Sqlite>;

macro_rules! ordered {
    ($query:expr, $column:expr, $direction:expr) => {
        match $direction {
            SortDirection::Ascending => $query.order($column.asc()),
            SortDirection::Descending => $query.order($column.desc()),
        }
    };
}

fn apply_filter(query: BoxedUsers, filter: &UserFilter) -> BoxedUsers {
    match filter {
        UserFilter::Email(email) => query.filter(users::email.eq(email.clone())),
        UserFilter::Role(role) => query.filter(users::role.eq(role.to_string())),
        UserFilter::IsActive(active) => query.filter(users::is_active.eq(*active)),
    }
}

// Optional columns are filtered to rows that have a value, so NULLs never
// show up in an ordered result.
fn apply_order(query: BoxedUsers, field: UserField, direction: SortDirection) -> BoxedUsers {
    match field {
        UserField::Id => ordered!(query, users::id, direction),
        UserField::Email => ordered!(query, users::email, direction),
        UserField::Username => ordered!(query, users::username, direction),
        UserField::Role => ordered!(query, users::role, direction),
        UserField::IsActive => ordered!(query, users::is_active, direction),
        UserField::FirstName => ordered!(
            query.filter(users::first_name.is_not_null()),
            users::first_name,
            direction
        ),
        UserField::LastName => ordered!(
            query.filter(users::last_name.is_not_null()),
            users::last_name,
            direction
        ),
        UserField::ProfileImageUrl => ordered!(
            query.filter(users::profile_image_url.is_not_null()),
            users::profile_image_url,
            direction
        ),
        UserField::LastLogin => ordered!(
            query.filter(users::last_login.is_not_null()),
            users::last_login,
            direction
        ),
        UserField::CreatedAt => ordered!(
            query.filter(users::created_at.is_not_null()),
            users::created_at,
            direction
        ),
        UserField::UpdatedAt => ordered!(
            query.filter(users::updated_at.is_not_null()),
            users::updated_at,
            direction
        ),
    }
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run blocking diesel work on a pooled connection off the async runtime
    async fn with_conn<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = self.pool.get().map_err(backend)?;

        tokio::task::spawn_blocking(move || work(&mut *conn))
            .await
            .map_err(backend)?
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn insert(&self, user: &User) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let new_user = NewUserModel::new(id.clone(), user);

        self.with_conn(move |conn| {
            diesel::insert_into(users::table)
                .values(&new_user)
                .execute(conn)
                .map_err(backend)
        })
        .await?;

        debug!(user_id = %id, "Inserted user document");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        let id = id.to_string();

        let model = self
            .with_conn(move |conn| {
                users::table
                    .find(id)
                    .select(UserModel::as_select())
                    .first::<UserModel>(conn)
                    .optional()
                    .map_err(backend)
            })
            .await?;

        model.map(User::try_from).transpose()
    }

    async fn query(&self, query: &UserQuery) -> Result<Vec<User>, StoreError> {
        let query = query.clone();

        let models = self
            .with_conn(move |conn| {
                let mut statement = users::table.into_boxed();

                for filter in &query.filters {
                    statement = apply_filter(statement, filter);
                }

                if let Some((field, direction)) = query.order_by {
                    statement = apply_order(statement, field, direction);
                }

                if let Some(limit) = query.limit {
                    statement = statement.limit(limit as i64);
                }

                statement.load::<UserModel>(conn).map_err(backend)
            })
            .await?;

        models.into_iter().map(User::try_from).collect()
    }

    async fn update(&self, id: &str, user: &User) -> Result<(), StoreError> {
        let changes = UserChangeset::from(user);
        let target = id.to_string();

        let updated = self
            .with_conn(move |conn| {
                diesel::update(users::table.find(target))
                    .set(&changes)
                    .execute(conn)
                    .map_err(backend)
            })
            .await?;

        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        debug!(user_id = id, "Updated user document");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let target = id.to_string();

        self.with_conn(move |conn| {
            diesel::delete(users::table.find(target))
                .execute(conn)
                .map_err(backend)
        })
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteUserStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let database = Database::new(path.to_str().unwrap()).unwrap();
        (dir, SqliteUserStore::new(database.get_pool().clone()))
    }

    fn user(email: &str, username: &str, role: UserRole, active: bool) -> User {
        let mut user = User::new(email.to_string(), username.to_string());
        user.role = role;
        user.is_active = active;
        user.created_at = Some(chrono::Utc::now());
        user.updated_at = user.created_at;
        user
    }

    #[tokio::test]
    async fn insert_assigns_id_and_get_reads_back() {
        let (_dir, store) = open_store();
        let mut alice = user("alice@example.com", "alice", UserRole::Admin, true);
        alice.first_name = Some("Alice".into());

        let id = store.insert(&alice).await.unwrap();
        let found = store.get(&id).await.unwrap().unwrap();

        assert_eq!(found.id.as_deref(), Some(id.as_str()));
        assert_eq!(found.email, "alice@example.com");
        assert_eq!(found.first_name.as_deref(), Some("Alice"));
        assert_eq!(found.role, UserRole::Admin);
        assert!(found.created_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_inserts_wait_for_the_write_lock() {
        let (_dir, store) = open_store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let username = format!("user{}", i);
                    let email = format!("{}@example.com", username);
                    store.insert(&user(&email, &username, UserRole::User, true)).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = store.query(&UserQuery::new()).await.unwrap();
        assert_eq!(all.len(), 64);
    }

    #[tokio::test]
    async fn get_missing_id_is_none() {
        let (_dir, store) = open_store();
        assert!(store.get("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_applies_filters_order_and_limit() {
        let (_dir, store) = open_store();
        store.insert(&user("c@example.com", "carol", UserRole::User, true)).await.unwrap();
        store.insert(&user("a@example.com", "alice", UserRole::Admin, true)).await.unwrap();
        store.insert(&user("b@example.com", "bob", UserRole::User, false)).await.unwrap();
        store.insert(&user("d@example.com", "dave", UserRole::User, true)).await.unwrap();

        let active_users = store
            .query(
                &UserQuery::new()
                    .filter(UserFilter::Role(UserRole::User))
                    .filter(UserFilter::IsActive(true))
                    .order_by(UserField::Username, SortDirection::Descending),
            )
            .await
            .unwrap();
        let names: Vec<_> = active_users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["dave", "carol"]);

        let first_two = store
            .query(
                &UserQuery::new()
                    .order_by(UserField::Email, SortDirection::Ascending)
                    .limit(2),
            )
            .await
            .unwrap();
        let emails: Vec<_> = first_two.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["a@example.com", "b@example.com"]);
        assert!(first_two.iter().all(|u| u.id.is_some()));
    }

    #[tokio::test]
    async fn ordering_by_optional_field_skips_missing_values() {
        let (_dir, store) = open_store();
        let mut named = user("n@example.com", "named", UserRole::User, true);
        named.last_name = Some("Smith".into());
        store.insert(&named).await.unwrap();
        store.insert(&user("x@example.com", "nameless", UserRole::User, true)).await.unwrap();

        let result = store
            .query(&UserQuery::new().order_by(UserField::LastName, SortDirection::Ascending))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].username, "named");
    }

    #[tokio::test]
    async fn update_merges_and_keeps_unset_optional_fields() {
        let (_dir, store) = open_store();
        let mut original = user("old@example.com", "oldname", UserRole::User, true);
        original.first_name = Some("Keep".into());
        let id = store.insert(&original).await.unwrap();

        let changes = user("new@example.com", "newname", UserRole::Moderator, false);
        store.update(&id, &changes).await.unwrap();

        let found = store.get(&id).await.unwrap().unwrap();
        assert_eq!(found.email, "new@example.com");
        assert_eq!(found.username, "newname");
        assert_eq!(found.role, UserRole::Moderator);
        assert!(!found.is_active);
        assert_eq!(found.first_name.as_deref(), Some("Keep"));
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let (_dir, store) = open_store();
        let err = store
            .update("ghost", &user("g@example.com", "ghost", UserRole::User, true))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("ghost".into()));
    }

    #[tokio::test]
    async fn delete_removes_and_tolerates_missing_ids() {
        let (_dir, store) = open_store();
        let id = store
            .insert(&user("a@example.com", "alice", UserRole::User, true))
            .await
            .unwrap();

        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
        store.delete(&id).await.unwrap();
    }
}
