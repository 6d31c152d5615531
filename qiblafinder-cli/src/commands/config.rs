//! `config` command - view and edit `~/.qiblafinder/config.ini`.

use std::path::Path;

use clap::Subcommand;
use qiblafinder::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name as section.key (e.g., location.latitude)
        key: String,
    },

    /// Change one setting; an empty value clears optional settings
    Set {
        /// Setting name as section.key (e.g., orientation.mode)
        key: String,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print every setting grouped by section
    List,

    /// Print the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'qiblafinder config list' to see available keys.",
            key
        ))
    })
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load()?;
    println!("{}", display_value(&config_key.get(&config)));
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load()?;
    config_key.set(&mut config, value)?;
    config.save()?;

    println!("Set {} = {}", config_key.name(), display_value(&config_key.get(&config)));
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    print!("{}", list_settings(&config, &config_file_path()));
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// Render every setting as an INI-like listing.
fn list_settings(config: &ConfigFile, path: &Path) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n", abbreviate_home(path)));

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            out.push_str(&format!("\n[{}]\n", section));
            current_section = section;
        }
        out.push_str(&format!(
            "  {} = {}\n",
            key.key_name(),
            display_value(&key.get(config))
        ));
    }
    out
}

/// Show paths under the home directory as `~/...`.
fn abbreviate_home(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}
