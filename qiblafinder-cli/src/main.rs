//! QiblaFinder CLI - live Qibla direction in the terminal
//!
//! # Commands
//!
//! - `bearing`: Qibla bearing and distance for a position
//! - `align`: evaluate a heading against a bearing
//! - `track`: live session fusing a position with an orientation stream
//! - `config`: view and edit `~/.qiblafinder/config.ini`

use clap::{Parser, Subcommand};
use console::style;

use qiblafinder::config::ConfigFile;
use qiblafinder::logging::{init_logging, LoggingConfig, LoggingGuard};

mod commands;
mod error;
mod render;

use error::CliError;

/// QiblaFinder - which way to face, from where you are
#[derive(Debug, Parser)]
#[command(name = "qiblafinder")]
#[command(version = qiblafinder::VERSION)]
#[command(about = "Find the Qibla direction from your position and device heading")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the Qibla bearing and distance for a position
    Bearing(commands::bearing::BearingArgs),

    /// Evaluate a device heading against a bearing
    Align(commands::align::AlignArgs),

    /// Run a live session and show alignment as the heading changes
    Track(commands::track::TrackArgs),

    /// View or edit configuration settings
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands must work even when the file holds invalid values
        Commands::Config { command } => commands::config::run(command),
        Commands::Bearing(args) => {
            let (_config, _guard) = load_config_and_logging()?;
            commands::bearing::run(args)
        }
        Commands::Align(args) => {
            let (_config, _guard) = load_config_and_logging()?;
            commands::align::run(args)
        }
        Commands::Track(args) => {
            let (config, _guard) = load_config_and_logging()?;
            commands::track::run(args, &config)
        }
    }
}

fn load_config_and_logging() -> Result<(ConfigFile, LoggingGuard), CliError> {
    let config = ConfigFile::load()?;
    let guard = init_logging(&LoggingConfig::from_settings(&config.logging))?;
    Ok((config, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use qiblafinder::config::OrientationMode;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bearing_with_negative_longitude() {
        let cli = Cli::try_parse_from(["qiblafinder", "bearing", "--lat", "40.7128", "--lon", "-74.006"])
            .unwrap();
        match cli.command {
            Commands::Bearing(args) => {
                assert_eq!(args.lat, 40.7128);
                assert_eq!(args.lon, -74.006);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_track_flags() {
        let cli = Cli::try_parse_from([
            "qiblafinder",
            "track",
            "--orientation",
            "none",
            "--json",
            "--duration",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Track(args) => {
                assert_eq!(args.orientation, Some(OrientationMode::None));
                assert!(args.json);
                assert_eq!(args.duration, Some(3));
                assert!(args.lat.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_track_lat_requires_lon() {
        assert!(Cli::try_parse_from(["qiblafinder", "track", "--lat", "10"]).is_err());
    }

    #[test]
    fn test_track_rejects_unknown_orientation() {
        assert!(Cli::try_parse_from(["qiblafinder", "track", "--orientation", "gyro"]).is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["qiblafinder", "config", "set", "location.longitude", "-0.1278"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Config { .. }));
    }
}
