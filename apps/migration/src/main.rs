//! Migration CLI tool.
//!
//! Reads `DATABASE_URL` and applies, rolls back or reports on the schema:
//! `migration up`, `migration down`, `migration status`, `migration fresh`.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info,sea_orm_migration=info")
        .init();

    tracing::info!("Running Microblog migrations");
    cli::run_cli(migration::Migrator).await;
}
