use clap::{Parser, Subcommand};
use karma_core::{config::AppConfig, AlertService};
use tracing_subscriber::EnvFilter;

mod commands;
use commands::{
    handle_alert_command, handle_config_command, handle_silence_command, print_error,
    AlertCommands, CliError, ConfigCommands, OutputFormat, SilenceCommands,
};

#[derive(Parser)]
#[command(name = "karma-cli")]
#[command(about = "Karma CLI - query alerts and manage silences on a Karma dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, global = true, env = "KARMA_MCP_CONFIG", default_value = "config/config.toml")]
    config: String,

    /// Dashboard URL, overrides the config file
    #[arg(long, global = true, env = "KARMA_URL")]
    karma_url: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Alerts(AlertCommands),

    /// Silence management
    #[command(subcommand)]
    Silences(SilenceCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn build_service(config_path: &str, karma_url: Option<&str>) -> Result<AlertService, CliError> {
    let mut config =
        AppConfig::from_file(config_path).map_err(|e| CliError::Config(e.to_string()))?;
    if let Some(url) = karma_url {
        config.karma.url = url.to_string();
    }
    config.validate().map_err(CliError::Config)?;
    Ok(AlertService::from_config(&config)?)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::from_flag(cli.json);
    let karma_url = cli.karma_url.as_deref();

    match cli.command {
        Commands::Config(command) => handle_config_command(command),
        Commands::Alerts(command) => {
            let service = build_service(&cli.config, karma_url)?;
            handle_alert_command(command, &service, format).await
        }
        Commands::Silences(command) => {
            let service = build_service(&cli.config, karma_url)?;
            handle_silence_command(command, &service, format).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so --json output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        print_error(&e.to_string());
        return Err(e.into());
    }

    Ok(())
}
