use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use domain::StoreError;

pub mod schema;
pub use schema::*;

pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const CREATE_USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        email TEXT NOT NULL,
        username TEXT NOT NULL,
        first_name TEXT,
        last_name TEXT,
        role TEXT NOT NULL DEFAULT 'user',
        profile_image_url TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        last_login TIMESTAMP,
        created_at TIMESTAMP,
        updated_at TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS users_email_idx ON users (email);
";

/// Applied to every pooled connection: writers wait on a locked database
/// instead of failing, and WAL lets readers run alongside a writer.
#[derive(Debug)]
struct SqliteConnectionOptions;

impl r2d2::CustomizeConnection<SqliteConnection, r2d2::Error> for SqliteConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the SQLite file at `database_path` and make sure the
    /// `users` table exists.
    pub fn new(database_path: &str) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_path);
        let pool = r2d2::Pool::builder()
            .connection_customizer(Box::new(SqliteConnectionOptions))
            .build(manager)
            .map_err(|e| StoreError::Backend(format!("Failed to create SQLite connection pool: {}", e)))?;

        let mut conn = pool
            .get()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        conn.batch_execute(CREATE_USERS_TABLE)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Database { pool })
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}
