pub mod cli;
pub mod config;

pub use cli::{Cli, Commands, RunArgs, ScenariosCommands, TsCommands};
pub use config::{HarnessConfig, SheddingConfig, DEFAULT_CONFIG_FILE};
