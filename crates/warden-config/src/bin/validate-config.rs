//! Config validation CLI tool
//!
//! Validates a wardend configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: validate-config <config-file>");
            eprintln!();
            eprintln!("Validates a wardend configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config /etc/wardend/config.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!(
            "Error: Configuration file not found: {}",
            config_path.display()
        );
        return ExitCode::from(1);
    }

    match warden_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!(
                "  Config version: {}",
                warden_config::CURRENT_CONFIG_VERSION
            );
            println!("  Houses: {}", policy.total_houses);
            println!(
                "  Countdown: {}s, preview alert at {}s remaining",
                policy.initial_duration_seconds, policy.preview_alert_seconds
            );
            println!(
                "  Overtime alerts at: {:?}",
                policy.overtime_alert_offsets
            );
            match policy.negative_ceiling_seconds {
                Some(ceiling) => println!("  Overtime ceiling: {}s", ceiling),
                None => println!("  Overtime ceiling: off"),
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                warden_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                warden_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                warden_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                warden_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        warden_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
