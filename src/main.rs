/// Version injected at compile time via OM_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("OM_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use om::commands::Commands;
use om::config::{Config, ConnectionOverrides};
use om::opsman::http::hint_for_error;
use om::ApiError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Command line client for Ops Manager
#[derive(Parser, Debug)]
#[command(name = "om", version = VERSION, about, long_about = None)]
struct Args {
    /// Ops Manager URL
    #[arg(short, long)]
    target: Option<String>,

    /// Admin username
    #[arg(short, long)]
    username: Option<String>,

    /// Admin password
    #[arg(short, long)]
    password: Option<String>,

    /// UAA client id, used instead of username and password
    #[arg(short, long)]
    client_id: Option<String>,

    /// UAA client secret
    #[arg(short = 's', long)]
    client_secret: Option<String>,

    /// Skip TLS certificate validation
    #[arg(short = 'k', long)]
    skip_ssl_validation: bool,

    /// Request timeout in seconds
    #[arg(short, long)]
    request_timeout: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

impl Args {
    fn connection_overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            target: self.target.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            skip_ssl_validation: self.skip_ssl_validation,
            request_timeout: self.request_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Log to a file; stdout carries the exported document and must stay clean.
/// `RUST_LOG` takes over from `--log-level` when set.
fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.is_empty())
        .map(|_| EnvFilter::from_default_env());

    let tracing_level = match (level.to_tracing_level(), &env_filter) {
        (Some(level), _) => level,
        (None, Some(_)) => Level::TRACE,
        (None, None) => return Ok(None),
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let builder = tracing_subscriber::fmt()
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    match env_filter {
        Some(filter) => builder.with_env_filter(filter).init(),
        None => builder.with_max_level(tracing_level).init(),
    }

    tracing::info!("om {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("om").join("om.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".om").join("om.log");
    }
    PathBuf::from("om.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: could not set up logging: {err:#}");
            None
        }
    };

    let overrides = args.connection_overrides();
    let config = Config::load();

    match args.command.execute(&overrides, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {err:#}");
            if let Some(hint) = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<ApiError>())
                .and_then(hint_for_error)
            {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}
