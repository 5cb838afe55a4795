//! # Command Line Interface
//!
//! Flags override the corresponding environment variables.

use clap::Parser;

use crate::config::ConfigOverrides;

#[derive(Parser, Debug, Default)]
#[command(name = "vaultgate")]
#[command(about = "Uniform REST interface over secret-management backends")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Secret backend to serve (overrides VAULTGATE_BACKEND)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Prefix scoping every secret name (overrides VAULTGATE_PREFIX)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Address to bind to (overrides VAULTGATE_BIND_ADDRESS)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT / VAULTGATE_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Output logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend.clone(),
            prefix: self.prefix.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: self.verbose.then(|| "debug".to_string()),
            json_logs: self.json_logs,
        }
    }
}
