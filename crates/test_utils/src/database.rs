//! Database Test Utilities
//!
//! Disposable PostgreSQL containers carrying the ledger schema, for the
//! adapter tests in `infra_db`. Tests using them are `#[ignore]`d by default
//! since they need Docker.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const IMAGE: (&str, &str) = ("postgres", "16-alpine");
const USER: &str = "ledger";
const PASSWORD: &str = "ledger";
const DATABASE: &str = "ledger_test";

/// Ledger schema, applied in one batch when the container comes up
const SCHEMA: &str = include_str!("../../infra_db/migrations/20240101000001_ledger_schema.sql");

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A running PostgreSQL container with the ledger schema applied
///
/// The container stops when this value is dropped.
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the ledger schema
    ///
    /// # Errors
    ///
    /// Returns an error if Docker is unavailable or the schema fails to apply
    pub async fn start() -> TestResult<Self> {
        let (image, tag) = IMAGE;
        let container = GenericImage::new(image, tag)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", USER)
            .with_env_var("POSTGRES_PASSWORD", PASSWORD)
            .with_env_var("POSTGRES_DB", DATABASE)
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_url(&host.to_string(), port))
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn connection_url(host: &str, port: u16) -> String {
    format!("postgres://{}:{}@{}:{}/{}", USER, PASSWORD, host, port, DATABASE)
}

/// Starts a fresh database for a single test
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::start().await
}
