use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gitlab-ci-exporter", version, about = "GitLab CI pipeline and job exporter")]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "config.toml",
        global = true,
        env = "GITLAB_EXPORTER_CONFIG"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the exporter server (default)
    Start {
        /// Override the configured listening port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start { port: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        let cli = Cli {
            config: PathBuf::from("config.toml"),
            command: None,
        };

        match cli.get_command() {
            Commands::Start { port } => assert!(port.is_none()),
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_cli_parsing_start_with_port() {
        let args = vec!["gitlab-ci-exporter", "start", "--port", "9100"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Start { port } => assert_eq!(port, Some(9100)),
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_cli_parsing_config_validate() {
        let args = vec![
            "gitlab-ci-exporter",
            "--config",
            "/etc/exporter.toml",
            "config",
            "validate",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.config, PathBuf::from("/etc/exporter.toml"));
        match cli.get_command() {
            Commands::Config { action } => assert!(matches!(action, ConfigCommands::Validate)),
            _ => panic!("Expected Config command"),
        }
    }
}
