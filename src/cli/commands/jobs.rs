use anyhow::Context;
use serde_json::json;

use crate::auth::Session;
use crate::backend::PgBackend;
use crate::cli::{print_json, OutputFormat};
use crate::services::JobBoard;

pub async fn handle(token: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let session = Session::from_token(token).context("invalid access token")?;
    let backend = PgBackend::connect().await.context("cannot reach the backend")?;
    let board = JobBoard::load(&backend, Some(&session)).await?;
    let jobs = board.visible();

    match output_format {
        OutputFormat::Json => print_json(&json!({
            "permissions": board.permissions(),
            "jobs": jobs,
            "by_status": board.count_by_status(),
        })),
        OutputFormat::Text => {
            if let Some(permissions) = board.permissions() {
                let shop = permissions.shop_id.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
                println!("Role: {}  Shop: {}", permissions.role, shop);
            }
            if jobs.is_empty() {
                println!("No visible jobs");
                return Ok(());
            }
            for job in &jobs {
                println!(
                    "{}  {:<14} {:<10} {:<20} {} ({})",
                    job.id, job.status, job.shop_id, job.customer_name, job.motorcycle, job.service_type
                );
            }
            println!("{} jobs, {} active", jobs.len(), board.active_count());
            Ok(())
        }
    }
}
