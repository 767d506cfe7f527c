use std::path::{Path, PathBuf};

mod batch;
mod extract;
mod inspect;
mod profiles;
mod terminal;

use batch::Batch;
use clap::ArgAction;
use extract::Extract;
use inspect::Inspect;
use profiles::Profiles;
use reqtract::{Config, Registry};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    ///
    /// Defaults are used if the file does not exist.
    #[arg(short, long, default_value = "reqtract.toml", global = true)]
    config: PathBuf,

    /// Additional directories to search for `*.toml` document profiles
    #[arg(short, long = "profiles", value_name = "DIR", global = true)]
    profile_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let context = Context::load(&self.config, &self.profile_dirs)?;
        self.command.run(&context)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Configuration and profiles shared by every command.
#[derive(Debug)]
pub struct Context {
    config: Config,
    registry: Registry,
}

impl Context {
    fn load(config_path: &Path, extra_dirs: &[PathBuf]) -> anyhow::Result<Self> {
        let config = if config_path.exists() {
            Config::load(config_path).map_err(|e| anyhow::anyhow!(e))?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Config::default()
        };

        let mut registry = Registry::builtin()?;
        for dir in config.profile_dirs.iter().chain(extra_dirs) {
            let added = registry.load_dir(dir)?;
            tracing::info!(dir = %dir.display(), added, "loaded profiles");
        }

        Ok(Self { config, registry })
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Extract requirements from a single document
    Extract(Extract),

    /// Extract requirements from many documents in parallel
    ///
    /// The profile of each document is detected from its file name, and a
    /// glossary named '<stem> Acronyms.txt' next to the document is applied
    /// if present.
    Batch(Batch),

    /// List the available document profiles
    Profiles(Profiles),

    /// Show how a document is segmented, without writing any output
    Inspect(Inspect),
}

impl Command {
    fn run(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Self::Extract(command) => command.run(context)?,
            Self::Batch(command) => command.run(context)?,
            Self::Profiles(command) => command.run(context)?,
            Self::Inspect(command) => command.run(context)?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}
