use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use apkpull::commands::{
    self,
    config::{Config, ConfigOverrides},
    parse_aliases, services,
};

/// apkpull - track Android packages and pull their newest releases
///
/// Packages are tracked in a local catalog under short aliases. `pull`
/// downloads the newest versions of tracked packages into
/// OUTPUT/<package>/<version>.apk, skipping versions already present.
///
/// Examples:
///   apkpull search github --track
///   apkpull pull github --last 3 --threads 3
///   apkpull pull --all
#[derive(Parser, Debug)]
#[command(author, version = env!("APKPULL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the catalog (defaults to ~/.apkpull)
    #[arg(long, env = "APKPULL_HOME", value_name = "PATH", global = true)]
    home: Option<PathBuf>,

    /// Root directory for pulled packages (defaults to HOME/output)
    #[arg(long, env = "APKPULL_OUTPUT", value_name = "PATH", global = true)]
    output: Option<PathBuf>,

    /// Base URL of the package site (defaults to https://apkpure.com)
    #[arg(long = "source-url", env = "APKPULL_SOURCE_URL", value_name = "URL", global = true)]
    source_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List tracked packages and their local versions
    #[command(visible_alias = "ls")]
    List,

    /// Search the package site
    #[command(visible_alias = "s")]
    Search(SearchArgs),

    /// Track a package by URL
    Track(TrackArgs),

    /// Show the newest remote versions of tracked packages
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Download the newest versions of tracked packages
    #[command(visible_alias = "p")]
    Pull(PullArgs),

    /// Stop tracking packages
    #[command(visible_alias = "u")]
    Untrack(SelectArgs),

    /// Change the alias of a tracked package
    Rename(RenameArgs),

    /// Remove output directories of packages that are no longer tracked
    Clean(CleanArgs),
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    /// Search terms; results of every term are merged
    #[arg(value_name = "TERM", required = true)]
    terms: Vec<String>,

    /// Track every result that is not tracked yet
    #[arg(long)]
    track: bool,
}

#[derive(clap::Args, Debug)]
struct TrackArgs {
    /// Package page URL, e.g. https://apkpure.com/github/com.github.android
    #[arg(value_name = "URL")]
    url: String,

    /// Alias to use instead of the package name
    #[arg(long, short)]
    alias: Option<String>,
}

#[derive(clap::Args, Debug)]
struct SelectArgs {
    /// Aliases, separate arguments or comma separated
    #[arg(value_name = "ALIAS")]
    aliases: Vec<String>,

    /// Select every tracked package
    #[arg(long, short)]
    all: bool,
}

#[derive(clap::Args, Debug)]
struct InfoArgs {
    #[command(flatten)]
    select: SelectArgs,

    /// Number of newest versions to show
    #[arg(long, short, default_value_t = 1)]
    last: usize,
}

#[derive(clap::Args, Debug)]
struct PullArgs {
    #[command(flatten)]
    select: SelectArgs,

    /// Number of newest versions to pull per package
    #[arg(long, short, default_value_t = 1)]
    last: usize,

    /// Number of parallel downloads (1-10)
    #[arg(long, short, default_value_t = 1)]
    threads: usize,
}

#[derive(clap::Args, Debug)]
struct RenameArgs {
    /// Current alias
    alias: String,

    /// New alias
    new_alias: String,
}

#[derive(clap::Args, Debug)]
struct CleanArgs {
    /// Do not ask for confirmation
    #[arg(long, short)]
    yes: bool,
}

impl SelectArgs {
    fn aliases(&self) -> Vec<String> {
        parse_aliases(&self.aliases, self.all)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = apkpull::runtime::RealRuntime;

    let config = Config::new(
        &runtime,
        ConfigOverrides {
            home: cli.home,
            output: cli.output,
            source_url: cli.source_url,
        },
    )?;

    match cli.command {
        Commands::List => commands::list(&runtime, &config)?,
        Commands::Search(args) => {
            let source = services::build_source(&config)?;
            commands::search(&runtime, &config, &source, &args.terms, args.track).await?
        }
        Commands::Track(args) => {
            commands::track(&runtime, &config, &args.url, args.alias.as_deref())?
        }
        Commands::Info(args) => {
            let source = services::build_source(&config)?;
            commands::info(&runtime, &config, &source, &args.select.aliases(), args.last).await?
        }
        Commands::Pull(args) => {
            let source = services::build_source(&config)?;
            commands::pull(
                &runtime,
                &config,
                &source,
                &args.select.aliases(),
                args.last,
                args.threads,
            )
            .await?
        }
        Commands::Untrack(args) => commands::untrack(&runtime, &config, &args.aliases())?,
        Commands::Rename(args) => {
            commands::rename(&runtime, &config, &args.alias, &args.new_alias)?
        }
        Commands::Clean(args) => commands::clean(&runtime, &config, args.yes)?,
    }
    Ok(())
}
