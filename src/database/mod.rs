//! database (db) union structure.
mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::friend::FriendRequestRepository;
use crate::user::UserRepository;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "tandem";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Storage handles shared with every route.
#[derive(Clone)]
pub struct Database {
    pub users: Arc<dyn UserRepository>,
    pub requests: Arc<dyn FriendRequestRepository>,
}

impl Database {
    /// Init database connections from configuration parts.
    pub async fn new(
        hostname: &str,
        username: &str,
        password: &str,
        db: &str,
        pool: u32,
    ) -> Result<Self, sqlx::Error> {
        let addr = format!("postgres://{username}:{password}@{hostname}/{db}");
        let database = Self::connect(&addr, pool).await?;

        tracing::info!(%hostname, %db, "postgres connected");

        Ok(database)
    }

    /// Connect to PostgreSQL and execute migrations scripts.
    pub async fn connect(url: &str, pool: u32) -> Result<Self, sqlx::Error> {
        let postgres = PgPoolOptions::new()
            .max_connections(pool)
            .connect(url)
            .await?;

        sqlx::migrate!()
            .run(&postgres)
            .await
            .map_err(|err| sqlx::Error::Migrate(Box::new(err)))?;

        let store = Arc::new(PgStore::new(postgres));
        Ok(Self {
            users: store.clone(),
            requests: store,
        })
    }

    /// In-process storage. Data is lost on restart.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            users: store.clone(),
            requests: store,
        }
    }
}
