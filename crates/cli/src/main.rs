//! `clientgen`: run the resolution pipeline over a project IR and print the
//! result.

#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use clientgen_core::{CollectPolicy, Generation, Generator, GeneratorConfig, Project, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod output;

#[derive(Parser, Debug)]
#[command(
    name = "clientgen",
    version,
    about = "Resolve an API project into client type definitions"
)]
struct Cli {
    /// Project IR (JSON)
    #[arg(long, value_name = "PATH")]
    ir: PathBuf,

    /// Generator configuration (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only generate this contract
    #[arg(long, value_name = "NAME")]
    contract: Option<String>,

    /// Override the configured collector policy
    #[arg(long, value_enum)]
    policy: Option<Policy>,

    #[arg(long, value_enum, default_value_t = Format::Summary)]
    format: Format,

    /// Log level ("debug", "info", ...) or a full filter spec.
    /// Falls back to CLIENTGEN_LOG.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    Native,
    Materialize,
}

impl From<Policy> for CollectPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Native => Self::Native,
            Policy::Materialize => Self::Materialize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Contracts, method signatures and definitions per namespace
    Summary,
    /// Full generation result as JSON
    Json,
    /// TypeScript-flavored preview of every namespace
    Preview,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(&cli) {
        Ok(rendered) => {
            print!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let project = Project::load(&cli.ir)?;
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(policy) = cli.policy {
        config = config.with_policy(policy.into());
    }
    debug!(ir = %cli.ir.display(), policy = ?config.policy, "loaded inputs");

    let contracts = match &cli.contract {
        Some(name) => vec![project.contract(name)?],
        None => project.contracts.iter().collect(),
    };

    let mut generator = Generator::new(&project, config);
    let contracts = contracts
        .into_iter()
        .map(|contract| generator.generate_contract(contract))
        .collect();
    let generation = Generation {
        contracts,
        definitions: generator.finish(),
    };

    output::render(&generation, cli.format)
}

fn init_tracing(level: Option<&str>) {
    let filter = match level
        .map(str::to_string)
        .or_else(|| std::env::var("CLIENTGEN_LOG").ok())
    {
        Some(level) if is_plain_level(&level) => {
            format!("clientgen={level},clientgen_core={level}")
        }
        Some(spec) => spec,
        None => "clientgen=warn,clientgen_core=warn".to_string(),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
