use std::path::Path;

use clap::Subcommand;
use karma_core::config::AppConfig;

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Show the effective configuration (file, environment and defaults)
    Show {
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Generate a sample configuration file
    Generate {
        #[arg(short, long, default_value = "config/config.toml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub const SAMPLE_CONFIG: &str = r#"# Karma alert engine configuration.
# Every key can be overridden with KARMA_MCP__<SECTION>__<KEY>, and KARMA_URL
# overrides karma.url.

[karma]
url = "http://localhost:8080"
request_timeout_seconds = 30
connect_timeout_seconds = 5
max_retries = 2
retry_backoff_ms = 100

[server]
bind_address = "127.0.0.1"
bind_port = 8080
max_concurrent_requests = 100

[silences]
default_duration = "2h"
default_created_by = "karma-mcp"

[logging]
level = "info"
format = "pretty"
"#;

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file } => show_config(&file),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn load(file: &str) -> CliResult<AppConfig> {
    AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_info(&format!("{file} not found, validating defaults and environment"));
    }

    let config = load(file)?;
    if let Err(e) = config.validate() {
        print_error(&e);
        return Err(CliError::Config(e));
    }

    print_success("Configuration is valid!");
    println!("  Karma: {}", config.karma.url);
    println!("  Server: {}:{}", config.server.bind_address, config.server.bind_port);
    println!("  Operation deadline: {:.1}s", config.operation_deadline().as_secs_f64());

    Ok(())
}

fn show_config(file: &str) -> CliResult<()> {
    let config = load(file)?;

    println!("Configuration from {file}:");

    println!("\n[Karma]");
    println!("  URL: {}", config.karma.url);
    println!("  Request Timeout: {}s", config.karma.request_timeout_seconds);
    println!("  Connect Timeout: {}s", config.karma.connect_timeout_seconds);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.karma.max_retries, config.karma.retry_backoff_ms
    );
    println!("  User Agent: {}", config.karma.user_agent);

    println!("\n[Server]");
    println!("  Bind Address: {}", config.server.bind_address);
    println!("  Bind Port: {}", config.server.bind_port);
    println!("  Max Concurrent Requests: {}", config.server.max_concurrent_requests);

    println!("\n[Silences]");
    println!("  Default Duration: {}", config.silences.default_duration);
    println!("  Default Author: {}", config.silences.default_created_by);

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Set karma.url to your dashboard before starting the server");

    Ok(())
}
