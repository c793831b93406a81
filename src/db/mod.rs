pub mod memory;
pub mod postgres;
pub mod session;
pub mod vote;

use crate::config::Config;
use actix::prelude::*;
use async_trait::async_trait;
use chrono::Duration;
use color_eyre::eyre::{Report, WrapErr};
use session::{InternalSession, SessionId};
use sqlx::{
    migrate::Migrator,
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::{info, warn};
use vote::{InternalVote, NewVote};

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a vote is already recorded for this identity and card")]
    Duplicate,
    #[error("session lifetime of {0} is out of range")]
    SessionTtl(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for votes and admin sessions.
///
/// `insert_vote` must be atomic with respect to the (identity, card) pair:
/// of two concurrent inserts for the same pair exactly one succeeds and the
/// other fails with [`StoreError::Duplicate`].
#[async_trait]
pub trait VoteStore: fmt::Debug + Send + Sync {
    async fn find_vote(
        &self,
        identity_id: &str,
        card_id: &str,
    ) -> Result<Option<InternalVote>, StoreError>;

    async fn insert_vote(&self, vote: NewVote) -> Result<InternalVote, StoreError>;

    async fn list_votes(&self) -> Result<Vec<InternalVote>, StoreError>;

    async fn save_session(
        &self,
        identity_id: &str,
        ttl: Duration,
    ) -> Result<InternalSession, StoreError>;

    async fn session_by_id(&self, id: &SessionId) -> Result<Option<InternalSession>, StoreError>;
}

#[derive(Debug)]
pub struct DbExecutor(pub Arc<dyn VoteStore>);

impl DbExecutor {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self(store)
    }

    pub fn store(&mut self) -> Arc<dyn VoteStore> {
        self.0.clone()
    }
}

impl Actor for DbExecutor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Db executor started");
    }
}

impl Default for DbExecutor {
    fn default() -> Self {
        unimplemented!("DbExecutor cannot automatically be started");
    }
}

impl SystemService for DbExecutor {}
impl Supervised for DbExecutor {}

pub async fn new_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    new_pool_with(database_url.parse()?, max_connections).await
}

pub async fn new_pool_with(
    connect_options: PgConnectOptions,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options)
        .await
}

/// Opens the configured store. Postgres gets its migrations applied before use.
pub async fn connect(config: &Config) -> Result<Arc<dyn VoteStore>, Report> {
    match &config.database_url {
        Some(database_url) => {
            let pool = new_pool(database_url, config.max_connections)
                .await
                .wrap_err("Failed to connect to database")?;
            MIGRATOR
                .run(&pool)
                .await
                .wrap_err("Failed to run database migrations")?;
            info!("Connected to postgres");
            Ok(Arc::new(postgres::PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, votes are kept in memory and lost on restart");
            Ok(Arc::new(memory::MemoryStore::default()))
        }
    }
}
