use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pangaea_datasets::app::{App, FetchOptions};
use pangaea_datasets::config::{ConfigLoader, Settings};
use pangaea_datasets::domain::Doi;
use pangaea_datasets::error::PangaeaError;
use pangaea_datasets::http::{PangaeaHttpClient, RequestOptions};
use pangaea_datasets::output::{JsonOutput, LogSink, OutputMode, TextOutput};
use pangaea_datasets::store::{AssumeYes, CacheStore, Confirm, StdinConfirm};

#[derive(Parser)]
#[command(name = "pangaea")]
#[command(about = "Fetch, cache and parse PANGAEA datasets by DOI")]
#[command(version, author)]
struct Cli {
    /// Settings file (defaults to ./pangaea.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the cache directory
    #[arg(long, global = true)]
    cache_dir: Option<Utf8PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve a DOI, download its datasets and print them")]
    Fetch(FetchArgs),
    #[command(about = "Inspect or clear the local cache")]
    Cache(CacheArgs),
}

#[derive(Args)]
struct FetchArgs {
    doi: String,

    /// Download again even when the dataset is cached
    #[arg(long)]
    overwrite: bool,

    #[arg(long)]
    json: bool,

    /// Extra request header, `Name: value`
    #[arg(long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long, requires = "user")]
    password: Option<String>,

    #[arg(long, conflicts_with = "user")]
    bearer: Option<String>,
}

#[derive(Args)]
struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommand,
}

#[derive(Subcommand)]
enum CacheCommand {
    #[command(about = "List cached files")]
    List {
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Remove cached files, all of them or those of the given DOIs")]
    Clear {
        dois: Vec<String>,

        /// Skip the confirmation prompt when clearing everything
        #[arg(short, long)]
        yes: bool,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PangaeaError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PangaeaError) -> u8 {
    match error {
        PangaeaError::MalformedIdentifier(_) => 2,
        PangaeaError::Http(_) | PangaeaError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        settings.cache_dir = dir;
    }

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, &settings, cli.verbose),
        Commands::Cache(args) => run_cache(args, &settings, cli.verbose),
    }
}

fn build_app(settings: &Settings) -> Result<App<PangaeaHttpClient>, PangaeaError> {
    let client = PangaeaHttpClient::new(settings)?;
    let store = CacheStore::new(settings.cache_dir.clone());
    Ok(App::new(store, client, settings.base_url.clone()))
}

fn run_fetch(args: FetchArgs, settings: &Settings, verbose: bool) -> miette::Result<()> {
    let doi: Doi = args.doi.parse()?;
    let mut request = RequestOptions {
        timeout: args.timeout.map(Duration::from_secs),
        bearer_token: args.bearer,
        ..RequestOptions::default()
    };
    for line in &args.headers {
        request = request.with_header_line(line)?;
    }
    if let Some(user) = args.user {
        request.basic_auth = Some((user, args.password));
    }
    let options = FetchOptions {
        overwrite: args.overwrite,
        request,
    };

    let app = build_app(settings)?;
    let result = app.fetch(&doi, &options, &LogSink { verbose })?;

    match output_mode(args.json) {
        OutputMode::Json => JsonOutput::print_fetch(&result).into_diagnostic(),
        OutputMode::Text => TextOutput::print_fetch(&result).into_diagnostic(),
    }
}

fn run_cache(args: CacheArgs, settings: &Settings, verbose: bool) -> miette::Result<()> {
    let app = build_app(settings)?;
    match args.command {
        CacheCommand::List { json } => {
            let result = app.list()?;
            match output_mode(json) {
                OutputMode::Json => JsonOutput::print_list(&result).into_diagnostic(),
                OutputMode::Text => TextOutput::print_list(&result).into_diagnostic(),
            }
        }
        CacheCommand::Clear { dois, yes, json } => {
            let dois = dois
                .iter()
                .map(|value| value.parse::<Doi>())
                .collect::<Result<Vec<_>, _>>()?;
            let confirm: &dyn Confirm = if yes { &AssumeYes } else { &StdinConfirm };
            let scope = (!dois.is_empty()).then_some(dois.as_slice());
            let result = app.clear(scope, confirm, &LogSink { verbose })?;
            match output_mode(json) {
                OutputMode::Json => JsonOutput::print_clear(&result).into_diagnostic(),
                OutputMode::Text => TextOutput::print_clear(&result).into_diagnostic(),
            }
        }
    }
}

fn output_mode(json: bool) -> OutputMode {
    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}
