use clap::{Args, Subcommand};

use crate::config::{self, ConfigError};

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    /// Parse the config file and report problems.
    Check,
    /// Print the config file location.
    Path,
}

pub fn run(args: ConfigArgs) -> Result<(), ConfigError> {
    match args.command {
        ConfigSubcommand::Check => {
            let path = config::validate_config()?;
            println!("config OK: {}", path.display());
        }
        ConfigSubcommand::Path => {
            let (path, _) = config::config_path()?;
            let status = if path.is_file() { "" } else { " (not found)" };
            println!("{}{status}", path.display());
        }
    }
    Ok(())
}
