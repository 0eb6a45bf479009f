//! `yardwatch entities`

use chrono::Utc;
use clap::Args;

use super::format::{ago, local_time};
use crate::error::CliError;
use crate::runner::CliRunner;
use yardwatch::store::EntityStore;

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Only entities last seen in this zone
    #[arg(long, value_name = "ZONE")]
    pub zone: Option<String>,
}

pub fn run(runner: &CliRunner, args: EntitiesArgs) -> Result<(), CliError> {
    let store = runner.open_store()?;
    let mut entities = store.list_entities()?;
    if let Some(zone) = &args.zone {
        entities.retain(|e| e.zone.as_str().eq_ignore_ascii_case(zone));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entities)?);
        return Ok(());
    }

    if entities.is_empty() {
        println!("No entities recorded.");
        return Ok(());
    }

    let now = Utc::now();
    println!(
        "{:<12} {:<10} {:<10} {:<8} {:<14} {:>5}  {:<8} {}",
        "ID", "LABEL", "MODEL", "ZONE", "POSITION", "CONF", "SENSOR", "LAST SEEN"
    );
    for e in &entities {
        println!(
            "{:<12} {:<10} {:<10} {:<8} {:<14} {:>5.2}  {:<8} {} ({})",
            e.id,
            e.label,
            e.model,
            e.zone,
            e.position.to_string(),
            e.confidence,
            e.source_sensor_id,
            local_time(&e.last_seen),
            ago(&e.last_seen, now),
        );
    }
    println!();
    println!("{} entities", entities.len());
    Ok(())
}
