use color_eyre::eyre::Error;
use dotenv::dotenv;
use lazy_static::lazy_static;
use sqlx::{postgres::PgConnectOptions, PgPool};
use tokio::sync::Mutex;
use tracing::{debug, span};
use voting_server::db;

lazy_static! {
    static ref CREATE_DB_MUTEX: Mutex<()> = Mutex::new(());
}

async fn create_test_db(pool: &PgPool, test_db: &str) -> Result<(), Error> {
    let _lock = CREATE_DB_MUTEX.lock().await;
    debug!("Creating new test db");

    sqlx::query(&format!("DROP DATABASE IF EXISTS {}", test_db))
        .execute(pool)
        .await?;
    sqlx::query(&format!("CREATE DATABASE {}", test_db))
        .execute(pool)
        .await?;
    Ok(())
}

async fn drop_test_db(pool: &PgPool, test_db: &str) -> Result<(), Error> {
    let _lock = CREATE_DB_MUTEX.lock().await;
    debug!("Dropping test db");
    sqlx::query(&format!("DROP DATABASE IF EXISTS {}", test_db))
        .execute(pool)
        .await?;
    Ok(())
}

/// A throwaway database with migrations applied, created next to the one
/// `DATABASE_URL` points at.
pub struct IntegrationTestDb {
    db_name: String,
    pool: PgPool,
    template_pool: PgPool,
}

impl IntegrationTestDb {
    /// `None` when `DATABASE_URL` is not set, so postgres tests can be skipped.
    pub async fn new() -> Option<Self> {
        dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").ok()?;
        let template_connect_options: PgConnectOptions = database_url
            .parse()
            .expect("DATABASE_URL is not a postgres url");

        // Creating test database with random name
        let db_name = format!("integration_{}", uuid::Uuid::new_v4().simple());
        let span = span!(tracing::Level::DEBUG, "test_db", test_db = db_name.as_str());
        let _enter = span.enter();
        let template_pool = db::new_pool_with(template_connect_options.clone(), 2)
            .await
            .expect("Unable to connect to DATABASE_URL");
        create_test_db(&template_pool, &db_name).await.unwrap();

        let integration_options = template_connect_options.database(&db_name);
        let pool = db::new_pool_with(integration_options, 5).await.unwrap();
        db::MIGRATOR.run(&pool).await.unwrap();

        Some(Self {
            db_name,
            pool,
            template_pool,
        })
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    /// Closes the test pool and drops the database.
    pub async fn teardown(self) {
        self.pool.close().await;
        drop_test_db(&self.template_pool, &self.db_name)
            .await
            .unwrap();
        self.template_pool.close().await;
        debug!(test_db = self.db_name.as_str(), "Dropped test db");
    }
}
