pub mod alerts;
pub mod config;
pub mod silences;
pub mod tables;
pub mod utils;

pub use alerts::{handle_alert_command, AlertCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use silences::{handle_silence_command, SilenceCommands};
pub use utils::{print_error, CliError, OutputFormat};
