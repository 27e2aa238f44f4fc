/// Database layer for Phaseplan
///
/// - `pool`: PostgreSQL connection pool with a start-up health check
/// - `migrations`: Embedded schema migrations
///
/// Models live in the crate-level `models` module. Every model function takes
/// a `sqlx::PgExecutor`, so the same query runs against the pool or inside a
/// transaction.
///
/// # Example
///
/// ```no_run
/// use phaseplan_shared::db::pool::{create_pool, PoolConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(PoolConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///     phaseplan_shared::db::migrations::run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
