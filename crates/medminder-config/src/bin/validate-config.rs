//! Config validation CLI tool
//!
//! Validates a medminder configuration file and reports any errors.

use medminder_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a medminder configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match medminder_config::load_config(&config_path) {
        Ok(config) => {
            let service = &config.service;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", medminder_config::CURRENT_CONFIG_VERSION);
            println!("  Socket: {}", service.socket_path.display());
            println!("  Data dir: {}", service.data_dir.display());
            println!("  Poll interval: {}s", service.poll_interval.as_secs());
            println!("  Sound: {}", if service.sound_enabled { "on" } else { "off" });
            println!("  Seed medicines: {}", config.seed_medicines.len());

            if !config.seed_medicines.is_empty() {
                println!();
                println!("Medicines:");
                for medicine in &config.seed_medicines {
                    let times = if medicine.times.is_empty() {
                        String::new()
                    } else {
                        format!(" at {}", medicine.times.join(", "))
                    };
                    println!(
                        "  - {} {} [{}]{}",
                        medicine.name,
                        medicine.dosage,
                        medicine.frequency.display_name(),
                        times
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                medminder_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                medminder_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                medminder_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                medminder_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        medminder_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
