//! `yardwatch alerts` and `yardwatch resolve`

use clap::Args;
use uuid::Uuid;

use super::format::{fit, local_time};
use crate::error::CliError;
use crate::runner::CliRunner;
use yardwatch::store::{EntityStore, StoreError};

#[derive(Debug, Args)]
pub struct AlertsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Only unresolved alerts
    #[arg(long)]
    pub pending: bool,
}

pub fn run(runner: &CliRunner, args: AlertsArgs) -> Result<(), CliError> {
    let store = runner.open_store()?;
    let mut alerts = store.list_alerts()?;
    if args.pending {
        alerts.retain(|a| !a.resolved);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("No alerts.");
        return Ok(());
    }

    println!(
        "{:<36} {:<9} {:<12} {:<19} {:<8} {}",
        "ID", "KIND", "ENTITY", "TIME", "STATE", "DESCRIPTION"
    );
    for a in &alerts {
        println!(
            "{:<36} {:<9} {:<12} {:<19} {:<8} {}",
            a.id,
            a.kind,
            a.entity_id,
            local_time(&a.timestamp),
            if a.resolved { "resolved" } else { "open" },
            fit(&a.description, 60),
        );
    }
    let open = alerts.iter().filter(|a| !a.resolved).count();
    println!();
    println!("{} alerts ({} open)", alerts.len(), open);
    Ok(())
}

pub fn resolve(runner: &CliRunner, alert_id: &str) -> Result<(), CliError> {
    let id = Uuid::parse_str(alert_id.trim()).map_err(|e| {
        CliError::InvalidArgument(format!("'{}' is not a valid alert id: {}", alert_id, e))
    })?;

    let store = runner.open_store()?;
    match store.resolve_alert(id) {
        Ok(()) => {
            println!("Resolved alert {}", id);
            Ok(())
        }
        Err(StoreError::NotFound(_)) => Err(CliError::InvalidArgument(format!(
            "No alert with id {}. Use 'yardwatch alerts' to list alerts.",
            id
        ))),
        Err(e) => Err(e.into()),
    }
}
