use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use nsmctl::cmd::{self, OutputFormat};
use nsmctl::domain::{Domain, DomainResolver};
use nsmctl::persistence::PersistentStore;
use nsmctl::resource::registry::Storages;
use nsmctl::resource::ResourceKind;

/// NSM command line tool
#[derive(Parser, Debug)]
#[command(name = "nsmctl", version = nsmctl::VERSION, about, long_about = None)]
struct Args {
    /// Domain profile to target instead of the persisted default
    #[arg(short, long)]
    domain: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print resources of a kind
    #[command(visible_alias = "describe")]
    Get {
        /// Resource kind or alias
        kind: String,
        /// Resource names; all resources of the kind when omitted
        names: Vec<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        out: OutputFormat,
    },
    /// Create or update a resource
    #[command(visible_alias = "apply")]
    Create {
        /// Resource kind or alias
        kind: String,
        /// Resource name; derived from the file when omitted
        name: Option<String>,
        /// YAML file describing the resource
        #[arg(short, long)]
        from_file: Option<PathBuf>,
    },
    /// Delete resources by name
    Delete {
        /// Resource kind or alias
        kind: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Pick the default domain for later invocations
    Use {
        /// Resource kind; only "domain" is supported
        kind: String,
        name: String,
    },
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

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return None;
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let store = PersistentStore::user_cache()?;
    let mut resolver = DomainResolver::new(store.clone());

    if let Some(name) = &args.domain {
        let profile: Domain = store.load(ResourceKind::Domain.dir_name(), name)?;
        resolver.set_current(profile);
    }

    let storages = Storages::new(store, Arc::new(resolver));

    match &args.command {
        Command::Get { kind, names, out } => cmd::get(&storages, kind, names, *out).await,
        Command::Create {
            kind,
            name,
            from_file,
        } => cmd::create(&storages, kind, name.as_deref(), from_file.as_deref()).await,
        Command::Delete { kind, names } => cmd::delete(&storages, kind, names).await,
        Command::Use { kind, name } => cmd::use_domain(&storages, kind, name).await,
    }
}
