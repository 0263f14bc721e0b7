//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! CLI binary at compile time, so the deployed binary carries its own schema.
//! The server never migrates on startup; this command is the only migration
//! path.

use tracing::info;

/// Run all pending migrations against `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    info!("Connected to database");

    info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
