use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

pub async fn handle(manager: &DatabaseManager, output_format: OutputFormat) -> anyhow::Result<()> {
    manager.migrate().await?;
    output_success(output_format, "Database migrations applied", None)
}
