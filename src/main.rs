use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use topoplan::config_loader::{self, CliOverrides};
use topoplan::orchestrator;

/// Topology assembly and address planning for network simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the scenario configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory for scenario.yaml and address_plan.json
    #[arg(short, long, default_value = "topology_output")]
    output: PathBuf,

    /// Override the host count of every bridged LAN
    #[arg(long)]
    lan_hosts: Option<usize>,

    /// Override the station count of every wireless cell
    #[arg(long)]
    stations: Option<usize>,

    /// Assemble and print the summary without writing any files
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = config_loader::load_config(&args.config)?;

    // Initialize logging; general.log_level is the default, RUST_LOG overrides it
    env_logger::Builder::from_env(Env::default().default_filter_or(config.general.log_filter())).init();

    info!("Starting topoplan");
    info!("Configuration file: {:?}", args.config);

    let overrides = CliOverrides {
        lan_hosts: args.lan_hosts,
        stations: args.stations,
    };
    if overrides.lan_hosts.is_some() || overrides.stations.is_some() {
        config_loader::apply_overrides(&mut config, &overrides)?;
    }

    let scenario = orchestrator::build_scenario(&config)?;
    orchestrator::print_summary(&config, &scenario);

    if args.dry_run {
        info!("Dry run: no files written");
        return Ok(());
    }

    info!("Output directory: {:?}", args.output);
    let files = orchestrator::write_outputs(&config, &scenario, &args.output)?;
    println!("  - Scenario written to {:?}", files.scenario);
    println!("  - Address plan written to {:?}", files.address_plan);

    info!("Topology generation completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["topoplan", "--config", "campus.yaml"]);

        assert_eq!(args.config, PathBuf::from("campus.yaml"));
        assert_eq!(args.output, PathBuf::from("topology_output"));
        assert_eq!(args.lan_hosts, None);
        assert_eq!(args.stations, None);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_override_args() {
        let args = Args::parse_from([
            "topoplan",
            "-c",
            "campus.yaml",
            "-o",
            "out",
            "--lan-hosts",
            "20",
            "--stations",
            "5",
            "--dry-run",
        ]);

        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.lan_hosts, Some(20));
        assert_eq!(args.stations, Some(5));
        assert!(args.dry_run);
    }

    #[test]
    fn test_config_is_required() {
        assert!(Args::try_parse_from(["topoplan"]).is_err());
    }
}
