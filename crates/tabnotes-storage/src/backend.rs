// Storage backend selection
// Decision: Use enum dispatch for backend choice, trait objects for what the core consumes
//
// A StorageBackend is either PostgreSQL (production) or the core's in-memory
// stores (dev mode); both hand out the same SessionStore/UserDirectory seams.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use tabnotes_core::{
    InMemorySessionStore, InMemoryUserDirectory, SessionStore, User, UserDirectory,
};

use crate::postgres::{PostgresSessionStore, PostgresUserDirectory};

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres {
        sessions: Arc<PostgresSessionStore>,
        users: Arc<PostgresUserDirectory>,
    },
    /// In-memory stores (dev mode)
    InMemory {
        sessions: Arc<InMemorySessionStore>,
        users: Arc<InMemoryUserDirectory>,
    },
}

impl StorageBackend {
    /// Connect to PostgreSQL and apply pending migrations
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("failed to connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;
        info!("database migrations applied");

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool without running migrations
    pub fn from_pool(pool: PgPool) -> Self {
        Self::Postgres {
            sessions: Arc::new(PostgresSessionStore::new(pool.clone())),
            users: Arc::new(PostgresUserDirectory::new(pool)),
        }
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        warn!("using in-memory storage; sessions are lost on restart");
        Self::InMemory {
            sessions: Arc::new(InMemorySessionStore::new()),
            users: Arc::new(InMemoryUserDirectory::new()),
        }
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory { .. })
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match self {
            Self::Postgres { sessions, .. } => sessions.clone(),
            Self::InMemory { sessions, .. } => sessions.clone(),
        }
    }

    pub fn user_directory(&self) -> Arc<dyn UserDirectory> {
        match self {
            Self::Postgres { users, .. } => users.clone(),
            Self::InMemory { users, .. } => users.clone(),
        }
    }

    /// Register a user if no user has this email yet
    pub async fn seed_user(&self, name: &str, email: &str) -> Result<User> {
        let user = match self {
            Self::Postgres { users, .. } => users.upsert_user(name, email).await?,
            Self::InMemory { users, .. } => match users.find_by_email(email).await? {
                Some(user) => user,
                None => users.insert(name, email),
            },
        };
        Ok(user)
    }

    /// Probe the backend
    pub async fn health_check(&self) -> Result<()> {
        self.session_store()
            .ping()
            .await
            .context("session store unreachable")
    }
}
