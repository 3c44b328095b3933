use dotenvy::dotenv;
use std::path::Path;
use stockbook::config::{self, catalog, database};
use stockbook::core::report;
use stockbook::errors::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Initialize the database and ensure the schema exists
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the starting catalog when a catalog file is present
    let catalog_path = config::catalog_path();
    if Path::new(&catalog_path).exists() {
        let starting_catalog = catalog::load_catalog(&catalog_path)?;
        let seeded = catalog::seed_catalog(&db, &starting_catalog)
            .await
            .inspect_err(|e| error!("Failed to seed starting catalog: {}", e))?;
        info!("Seeded {} products from {}", seeded, catalog_path);
    } else {
        info!("No catalog file at {}, skipping seeding", catalog_path);
    }

    // 5. Log startup state so operators can sanity-check the ledger
    let stats = report::get_dashboard_stats(&db).await?;
    info!(
        "Stockbook ready: {} active products, {} sale lines, commit timeout {:?}",
        stats.total_products,
        stats.total_orders,
        config::sale_commit_timeout()
    );

    Ok(())
}
