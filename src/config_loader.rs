use crate::config::{Config, SegmentConfig};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load, parse and validate a scenario configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file {:?}", config_path))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file {:?}", config_path))?;

    info!(
        "Parsed {} segments, {} declared nodes, {} flows",
        config.segments.len(),
        config.nodes.len(),
        config.traffic.len()
    );

    config.validate()?;

    Ok(config)
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Host count for every bridged LAN
    pub lan_hosts: Option<usize>,
    /// Station count for every wireless cell
    pub stations: Option<usize>,
}

/// Apply CLI overrides to a configuration and re-validate it
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    for segment in config.segments.iter_mut() {
        match segment {
            SegmentConfig::BridgedLan { name, hosts, .. } => {
                if let Some(count) = overrides.lan_hosts {
                    info!("Overriding host count of '{}': {} -> {}", name, hosts, count);
                    *hosts = count;
                }
            }
            SegmentConfig::WirelessCell { name, stations, .. } => {
                if let Some(count) = overrides.stations {
                    info!("Overriding station count of '{}': {} -> {}", name, stations, count);
                    *stations = count;
                }
            }
            SegmentConfig::PointToPoint { .. } => {}
        }
    }

    config
        .validate()
        .wrap_err("Configuration is invalid after applying command-line overrides")?;

    Ok(())
}
