//! Command-line entry point shared by both generator binaries.
//!
//! The binaries only pick a [`DatasetVariant`]; argument parsing, client
//! construction and the run itself live here so they can be exercised in
//! tests without spawning a process.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches, Parser};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reqwest::Url;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::descriptor::{DatasetVariant, RunContext};
use crate::error::{PublishError, RunError};
use crate::http::{ClientSettings, HttpDataverseApi};
use crate::payload::PayloadRenderer;
use crate::publisher::DatasetPublisher;
use crate::runner::{RunSettings, publish_datasets, render_datasets};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Generator command arguments.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct CliArgs {
    /// Dataverse server URL; defaults to the variant's development server.
    #[arg(short = 'u', long = "url", env = "DATAVERSE_SERVER_URL", value_name = "url")]
    pub server_url: Option<String>,
    /// Number of datasets to generate.
    #[arg(short = 'n', long = "count", default_value_t = 1, value_name = "n")]
    pub count: usize,
    /// API token sent as `X-Dataverse-key`.
    #[arg(
        short = 'a',
        long = "api-token",
        env = "DATAVERSE_API_TOKEN",
        hide_env_values = true,
        required_unless_present = "dry_run",
        value_name = "token"
    )]
    pub api_token: Option<String>,
    /// Accept self-signed or otherwise invalid TLS certificates.
    #[arg(short = 'i', long = "insecure")]
    pub insecure: bool,
    /// File reserved for created dataset identifiers; not written.
    #[arg(long = "output", default_value = "testdata_pids.txt", value_name = "file")]
    pub output: PathBuf,
    /// Collection alias to create datasets in; defaults per variant.
    #[arg(long = "parent", value_name = "alias")]
    pub parent: Option<String>,
    /// Seed for the random generator; random when omitted.
    #[arg(long = "seed", value_name = "seed")]
    pub seed: Option<u64>,
    /// Per-request timeout in seconds; must be at least 1.
    #[arg(
        long = "timeout-secs",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "secs"
    )]
    pub timeout_secs: u64,
    /// Print rendered payloads instead of sending them.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Generator variant.
    pub variant: DatasetVariant,
    /// Dataverse server URL.
    pub server_url: Url,
    /// API token; absent only for dry runs.
    pub api_token: Option<String>,
    /// Verify server TLS certificates.
    pub verify_tls: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Collection alias datasets are created in.
    pub parent: String,
    /// Number of datasets.
    pub count: usize,
    /// Random generator seed.
    pub seed: u64,
    /// Render only.
    pub dry_run: bool,
    /// Reserved output file.
    pub output: PathBuf,
}

/// Errors surfaced by the command-line flow.
#[derive(Debug, Error)]
pub enum CliError {
    /// The server URL could not be parsed.
    #[error("invalid server URL '{value}': {message}")]
    InvalidServerUrl {
        /// Raw value supplied.
        value: String,
        /// Parser error message.
        message: String,
    },
    /// The parent collection alias is blank.
    #[error("parent collection alias must not be empty")]
    BlankParent,
    /// No API token was supplied for a live run.
    #[error("missing API token: set --api-token or DATAVERSE_API_TOKEN")]
    MissingApiToken,
    /// The async runtime could not be started.
    #[error("failed to start runtime: {message}")]
    Runtime {
        /// Underlying error message.
        message: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to configure HTTP client: {source}")]
    Client {
        /// Underlying client error.
        #[source]
        source: PublishError,
    },
    /// The run failed.
    #[error(transparent)]
    Run(#[from] RunError),
}

impl CliArgs {
    /// Resolves defaults for `variant` and validates the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when the server URL is invalid, the parent alias
    /// is blank, or a live run has no API token.
    pub fn into_config(self, variant: DatasetVariant) -> Result<RunConfig, CliError> {
        let raw_url = self
            .server_url
            .unwrap_or_else(|| variant.default_server_url().to_owned());
        let server_url = Url::parse(&raw_url).map_err(|err| CliError::InvalidServerUrl {
            value: raw_url.clone(),
            message: err.to_string(),
        })?;

        let parent = self
            .parent
            .unwrap_or_else(|| variant.default_parent().to_owned());
        if parent.trim().is_empty() {
            return Err(CliError::BlankParent);
        }

        let api_token = self.api_token.filter(|token| !token.trim().is_empty());
        if api_token.is_none() && !self.dry_run {
            return Err(CliError::MissingApiToken);
        }

        Ok(RunConfig {
            variant,
            server_url,
            api_token,
            verify_tls: !self.insecure,
            timeout: Duration::from_secs(self.timeout_secs),
            parent,
            count: self.count,
            seed: self.seed.unwrap_or_else(random_seed),
            dry_run: self.dry_run,
            output: self.output,
        })
    }
}

/// Parses arguments under the variant's program name.
///
/// # Errors
///
/// Returns the clap error for invalid arguments, `--help` and `--version`.
pub fn parse_args<I, T>(variant: DatasetVariant, args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let (name, about) = program(variant);
    let matches = CliArgs::command()
        .name(name)
        .about(about)
        .try_get_matches_from(args)?;
    CliArgs::from_arg_matches(&matches)
}

/// Runs a generator binary to completion.
#[must_use]
pub fn run(variant: DatasetVariant) -> ExitCode {
    init_tracing();
    let args = parse_args(variant, std::env::args_os()).unwrap_or_else(|err| err.exit());

    match run_with_args(variant, args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "{err}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run_with_args(variant: DatasetVariant, args: CliArgs) -> Result<(), CliError> {
    let config = args.into_config(variant)?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::Runtime {
            message: err.to_string(),
        })?;
    let mut stdout = io::stdout().lock();
    runtime.block_on(execute(&config, &mut stdout))
}

/// Executes a configured run, writing confirmations to `out`.
///
/// # Errors
///
/// Returns [`CliError`] when the client cannot be built or the run fails.
pub async fn execute<W>(config: &RunConfig, out: &mut W) -> Result<(), CliError>
where
    W: Write + ?Sized,
{
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let context = RunContext::from_rng(&mut rng, timestamp_now());
    info!(
        variant = ?config.variant,
        seed = config.seed,
        run_id = %context.run_id(),
        count = config.count,
        dry_run = config.dry_run,
        "starting run"
    );
    debug!(output = %config.output.display(), "output file is reserved and not written");

    let settings = RunSettings {
        variant: config.variant,
        parent: config.parent.clone(),
        count: config.count,
    };
    let renderer = PayloadRenderer::default();

    if config.dry_run {
        render_datasets(&settings, &context, &renderer, &mut rng, out)?;
        return Ok(());
    }

    let api_token = config.api_token.clone().ok_or(CliError::MissingApiToken)?;
    let api = HttpDataverseApi::new(ClientSettings {
        server_url: config.server_url.clone(),
        api_token,
        verify_tls: config.verify_tls,
        timeout: config.timeout,
    })
    .map_err(|source| CliError::Client { source })?;
    let publisher = DatasetPublisher::new(api);

    let published =
        publish_datasets(&settings, &context, &renderer, &publisher, &mut rng, out).await?;
    info!(published, "run complete");
    Ok(())
}

/// Installs the stderr `tracing` subscriber; `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

const fn program(variant: DatasetVariant) -> (&'static str, &'static str) {
    match variant {
        DatasetVariant::Archaeology => (
            "archaeology-testdata",
            "Generate and publish test datasets with random RD points and boxes",
        ),
        DatasetVariant::Dccd => (
            "dccd-testdata",
            "Generate and publish DCCD test datasets with one random WGS84 point",
        ),
    }
}

fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn random_seed() -> u64 {
    rand::rng().random()
}
