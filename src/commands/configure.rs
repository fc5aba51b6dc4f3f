//! configure command

use crate::config::Config;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct ConfigureArgs {
    /// Ops Manager URL to use by default
    #[arg(long)]
    pub target: Option<String>,

    /// Username to use by default
    #[arg(long)]
    pub username: Option<String>,

    /// UAA client id to use by default
    #[arg(long)]
    pub client_id: Option<String>,

    /// Skip TLS certificate validation by default
    #[arg(long)]
    pub skip_ssl_validation: Option<bool>,

    /// Default request timeout in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,
}

pub fn execute(args: ConfigureArgs, mut config: Config) -> Result<()> {
    config.merge(Config {
        target: args.target,
        username: args.username,
        client_id: args.client_id,
        skip_ssl_validation: args.skip_ssl_validation,
        request_timeout: args.request_timeout,
    });

    let path = config.save()?;
    eprintln!("saved configuration to {}", path.display());
    Ok(())
}
