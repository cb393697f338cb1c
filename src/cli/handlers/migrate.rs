use super::base::{Completion, database_path};
use crate::cli::output::OutputFormatter;
use crate::config::Config;
use crate::error::Result;
use crate::storage::Database;
use serde_json::json;
use std::path::Path;

/// Handle the migrate command
///
/// Opening the database applies any pending migrations.
pub async fn handle_migrate(
    config: &Config,
    database: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<Completion> {
    let path = database_path(config, database);
    let db = Database::open(&config.database, &path).await?;
    let report = db.migration_report().clone();
    db.close().await;

    if formatter.is_json() {
        formatter.print_json(&json!({
            "status": "ok",
            "database": path,
            "from": report.from,
            "to": report.to,
            "applied": report.applied,
        }))?;
    } else if report.is_noop() {
        formatter.info(&format!(
            "Database {} is up to date (schema version {})",
            path.display(),
            report.to
        ));
    } else {
        formatter.success(&format!(
            "Migrated {} from schema version {} to {}",
            path.display(),
            report.from,
            report.to
        ));
    }
    Ok(Completion::Done)
}
