use anyhow::Result;
use colored::Colorize;
use gitlab_ci_exporter::config::{self, Config};
use std::path::Path;

/// Execute the config show command
///
/// Displays the effective configuration after defaults and environment overrides
pub fn show(path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());

    let cfg = config::load_config(path)?;

    println!("{}", "Current Configuration:".green().bold());
    println!();

    // Serialize to TOML format
    let toml_string = toml::to_string_pretty(&cfg)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
///
/// Validates the configuration file
pub fn validate(path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());

    let cfg = config::load_config(path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    print_summary(&cfg);

    Ok(())
}

fn print_summary(cfg: &Config) {
    println!("{}", "Summary:".bold());
    println!("  {}: {}:{}", "Listen".cyan(), cfg.server.host, cfg.server.port);
    println!("  {}: {} ({})", "Logging".cyan(), cfg.server.log_level, cfg.server.log_format);
    println!("  {}: {}", "Cache TTL".cyan(), format_ttl(cfg.cache.ttl_seconds));
    println!("  {}: {}ms", "Sweep Interval".cyan(), cfg.cache.sweep_interval_ms);
}

/// Render a TTL in the largest whole unit
fn format_ttl(seconds: u64) -> String {
    match seconds {
        s if s % 3600 == 0 => format!("{}h", s / 3600),
        s if s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}
