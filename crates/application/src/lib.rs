use config::{Config, StoreBackend};
use domain::*;
use infrastructure::*;
use std::sync::Arc;
use tracing::info;

/// User Application - wires a users collection to the domain services
#[derive(Clone)]
pub struct UserApp {
    pub user_service: Arc<UserService>,
}

impl UserApp {
    pub fn new(config: &Config) -> Result<Self, DomainError> {
        let store: Arc<dyn UserStore> = match config.store_backend {
            StoreBackend::Sqlite => {
                // Infrastructure layer - database setup
                let database = Database::new(&config.database_path)?;
                info!("💾 Using SQLite users collection at {}", config.database_path);
                Arc::new(SqliteUserStore::new(database.get_pool().clone()))
            }
            StoreBackend::Memory => {
                info!("🧪 Using in-memory users collection");
                Arc::new(MemoryUserStore::new())
            }
        };

        Ok(Self::with_store(store))
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryUserStore::new()))
    }

    pub fn with_store(store: Arc<dyn UserStore>) -> Self {
        Self {
            user_service: Arc::new(UserService::new(store)),
        }
    }

    /// Bind a record to this application's user service
    pub fn profile(&self, user: User) -> UserProfile {
        UserProfile::new(user, self.user_service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_config(path: &str) -> Config {
        Config {
            api_host: "127.0.0.1".to_string(),
            api_port: 0,
            database_path: path.to_string(),
            store_backend: StoreBackend::Sqlite,
            log_filter: "off".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_find_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let app = UserApp::new(&sqlite_config(path.to_str().unwrap())).unwrap();

        let created = app
            .user_service
            .create(UserDraft::new("john.doe@example.com", "johndoe"))
            .await
            .unwrap();
        let id = created.id.clone().unwrap();

        let by_id = app.user_service.find_by_id(&id).await.unwrap();
        assert_eq!(by_id.username, "johndoe");
        assert_eq!(by_id.role, UserRole::User);
        assert!(by_id.is_active);

        let by_email = app.user_service.find_by_email("john.doe@example.com").await;
        assert_eq!(by_email.and_then(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn full_lifecycle_in_memory() {
        let app = UserApp::in_memory();
        let users = &app.user_service;

        let admin = users
            .create(UserDraft {
                role: Some(UserRole::Admin),
                ..UserDraft::new("admin@example.com", "adminuser")
            })
            .await
            .unwrap();
        let member = users
            .create(UserDraft::new("member@example.com", "member"))
            .await
            .unwrap();
        let member_id = member.id.clone().unwrap();

        let admins = users
            .list(
                ListFilters {
                    role: Some(UserRole::Admin),
                    ..ListFilters::default()
                },
                ListOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].id, admin.id);

        let updated = users
            .update(
                &member_id,
                UserDraft {
                    is_active: Some(false),
                    ..UserDraft::new("member@example.com", "member2")
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id.as_deref(), Some(member_id.as_str()));

        let inactive = users
            .list(
                ListFilters {
                    is_active: Some(false),
                    ..ListFilters::default()
                },
                ListOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].username, "member2");

        users.delete(&member_id).await.unwrap();
        assert!(users.find_by_id(&member_id).await.is_none());
    }

    #[tokio::test]
    async fn update_without_role_or_active_flag_resets_them_to_defaults() {
        let app = UserApp::in_memory();
        let users = &app.user_service;

        let created = users
            .create(UserDraft {
                role: Some(UserRole::Admin),
                is_active: Some(false),
                ..UserDraft::new("admin@example.com", "adminuser")
            })
            .await
            .unwrap();
        let id = created.id.clone().unwrap();
        assert_eq!(created.role, UserRole::Admin);
        assert!(!created.is_active);

        let updated = users
            .update(&id, UserDraft::new("admin@example.com", "adminuser"))
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::User);
        assert!(updated.is_active);

        let stored = users.find_by_id(&id).await.unwrap();
        assert_eq!(stored.role, UserRole::User);
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn profile_shares_the_application_service() {
        let app = UserApp::in_memory();
        let mut user = User::new("jane@example.com".into(), "janedoe".into());
        user.first_name = Some("Jane".into());
        user.last_name = Some("Doe".into());

        let profile = app.profile(user);
        profile
            .create(profile.serialize().into())
            .await
            .unwrap();

        assert_eq!(profile.full_name(), "Jane Doe");
        let listed = app
            .user_service
            .list(ListFilters::default(), ListOptions::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].first_name.as_deref(), Some("Jane"));
    }
}
