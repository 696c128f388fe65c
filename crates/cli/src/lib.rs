mod cache;
mod index;
mod stubs;

pub use cache::CacheCommands;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use stubscope_core::logging::{LogSettings, init_logging};
use stubscope_core::{StubCache, StubConfig};
use stubscope_java::{JavaNamingConvention, JavaSourceParser};
use stubscope_plugin::{NamingConvention, SourceParser};

#[derive(Parser)]
#[command(
    name = "stubscope",
    version,
    about = "Build, cache and index stub trees of Java sources",
    long_about = "Stubscope reduces each source file to a compact stub tree: its declarations, \
                  their qualified names and supertypes. Stub trees are persisted in a cache so \
                  that unchanged files are never parsed twice, and feed a declaration index."
)]
pub struct Cli {
    /// JSON file with cache settings (defaults come from the environment)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Store persisted stub trees without compression
    #[arg(long, global = true)]
    pub no_compress: bool,

    /// Also log to stderr, at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build (or load from cache) the stubs of one source file
    Build {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Print the stub tree of a source file or of a persisted .stubs file
    Dump {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Print the index keys of every declaration instead of the tree
        #[arg(long)]
        keys: bool,
    },
    /// Build stubs for every Java file under a directory and index them
    #[command(
        long_about = "Walks the directory (honouring .gitignore), builds or loads the stubs of \
                      every Java file in parallel and reports what was indexed. With --key, \
                      prints the files declaring that key, e.g. `class:Account` or \
                      `super:Comparable`."
    )]
    Index {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,
        /// Index key to look up, as `category:value`
        #[arg(long)]
        key: Vec<String>,
    },
    /// Inspect or clear the stub cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Print the effective configuration as JSON
    Config,
}

/// Everything a command needs to load stubs.
pub(crate) struct Session {
    pub cache: StubCache,
    pub parser: Arc<dyn SourceParser>,
    pub naming: Arc<dyn NamingConvention>,
}

impl Session {
    fn new(config: StubConfig) -> anyhow::Result<Self> {
        let parser = JavaSourceParser::new().context("Failed to set up the Java parser")?;
        Ok(Self {
            cache: StubCache::new(config),
            parser: Arc::new(parser),
            naming: Arc::new(JavaNamingConvention),
        })
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<StubConfig> {
    let mut config = match &cli.config {
        Some(path) => StubConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => StubConfig::from_env(),
    };
    if cli.no_compress {
        config.compress = false;
    }
    Ok(config)
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = LogSettings::new("cli").verbose(cli.verbose);
    let _guard = match init_logging(&settings) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {}", e);
            None
        }
    };

    let config = load_config(&cli)?;
    match cli.command {
        Commands::Build { path } => stubs::build(&Session::new(config)?, &path),
        Commands::Dump { path, keys } => stubs::dump(&Session::new(config)?, &path, keys),
        Commands::Index { path, key } => index::run(&Session::new(config)?, &path, &key),
        Commands::Cache { command } => cache::run(&StubCache::new(config), command),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
