//! `yardwatch sensors`

use clap::Subcommand;
use yardwatch::detection::SensorStatus;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Clone, Subcommand)]
pub enum SensorCommands {
    /// List configured sensors
    List,

    /// Mark a sensor online or offline in the config file
    Set {
        /// Sensor id (e.g., CAM2)
        id: String,

        /// online or offline
        #[arg(value_parser = parse_status)]
        status: SensorStatus,
    },
}

fn parse_status(value: &str) -> Result<SensorStatus, String> {
    value.parse()
}

pub fn run(runner: CliRunner, command: SensorCommands) -> Result<(), CliError> {
    match command {
        SensorCommands::List => run_list(&runner),
        SensorCommands::Set { id, status } => run_set(runner, &id, status),
    }
}

fn run_list(runner: &CliRunner) -> Result<(), CliError> {
    let sensors = &runner.config().sensors;
    println!(
        "{:<8} {:<14} {:<14} {:>8} {:>4}  {}",
        "ID", "NAME", "POSITION", "COVERAGE", "FPS", "STATUS"
    );
    for sensor in sensors {
        println!(
            "{:<8} {:<14} {:<14} {:>7}m {:>4}  {}",
            sensor.id,
            sensor.name,
            sensor.position.to_string(),
            sensor.coverage,
            sensor.fps,
            sensor.status
        );
    }
    let online = sensors.iter().filter(|s| s.is_operational()).count();
    println!();
    println!("{} sensors ({} online)", sensors.len(), online);
    Ok(())
}

fn run_set(mut runner: CliRunner, id: &str, status: SensorStatus) -> Result<(), CliError> {
    let sensor = runner
        .config_mut()
        .sensors
        .iter_mut()
        .find(|s| s.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "Unknown sensor '{}'. Use 'yardwatch sensors' to list sensors.",
                id
            ))
        })?;
    sensor.status = status;
    let sensor_id = sensor.id.clone();

    let path = runner.config_path().clone();
    runner.config().save_to(&path)?;
    println!("{} is now {}", sensor_id, status);
    println!("Saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yardwatch::config::ConfigFile;

    #[test]
    fn test_set_persists_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let runner = CliRunner::new(Some(path.clone())).unwrap();
        run_set(runner, "cam2", SensorStatus::Offline).unwrap();

        let saved = ConfigFile::load_from(&path).unwrap();
        let cam2 = saved.sensors.iter().find(|s| s.id == "CAM2").unwrap();
        assert_eq!(cam2.status, SensorStatus::Offline);
    }

    #[test]
    fn test_set_unknown_sensor_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CliRunner::new(Some(dir.path().join("config.ini"))).unwrap();
        assert!(matches!(
            run_set(runner, "CAM99", SensorStatus::Online),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
