//! Command-line parsing and dispatch for the Artie CLI.

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};

use anyhow::anyhow;
use artie_telemetry::{DEFAULT_LOG_LEVEL, LoggingConfig, init_logging};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::client::{ArtieClient, CliError, CliResult};
use crate::commands::deployments::{
    handle_cancel_backfill, handle_deploy_deployment, handle_get_deployment,
    handle_list_deployments,
};
use crate::commands::source_readers::handle_deploy_source_reader;
use crate::config::{self, CliConfig};

/// Reads configuration from the process environment, parses `argv`, executes
/// the requested command, and returns the process exit code.
pub async fn run() -> i32 {
    let lookup = |key: &str| env::var(key).ok();
    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: config::log_format(lookup),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    run_with(env::args_os(), lookup).await
}

/// Entry sequence shared by the binary and tests: configuration first, then
/// argument parsing, then a single execution attempt.
pub(crate) async fn run_with<I, T>(args: I, lookup: impl Fn(&str) -> Option<String>) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let (cli, config) = match prepare(args, lookup) {
        Ok(Some(prepared)) => prepared,
        Ok(None) => return 0,
        Err(err) => return report(&err),
    };

    let command_name = command_label(&cli.command);
    tracing::debug!(command = command_name, "executing command");

    match execute(cli, &config).await {
        Ok(()) => 0,
        Err(err) => report(&err),
    }
}

/// Load configuration and parse `argv`. `Ok(None)` means clap already printed
/// help or version text and there is nothing to execute.
pub(crate) fn prepare<I, T>(
    args: I,
    lookup: impl Fn(&str) -> Option<String>,
) -> CliResult<Option<(Cli, CliConfig)>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = CliConfig::from_lookup(lookup)?;

    match parse_command(args) {
        Ok(cli) => Ok(Some((cli, config))),
        Err(err) if !err.use_stderr() => {
            if let Err(print_err) = err.print() {
                tracing::debug!(error = %print_err, "failed to print help output");
            }
            Ok(None)
        }
        Err(err) => Err(classify_parse_error(&err)),
    }
}

fn report(err: &CliError) -> i32 {
    eprintln!("error: {}", err.display_message());
    err.exit_code()
}

/// Parse `argv` (including the program name) into a command.
pub(crate) fn parse_command<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Build the API client and run the command, aborting on operator interrupt.
pub(crate) async fn execute(cli: Cli, config: &CliConfig) -> CliResult<()> {
    let client = ArtieClient::new(config)?;
    let mut stdout = io::stdout();

    tokio::select! {
        result = dispatch(cli, &client, &mut stdout) => result,
        err = interrupted() => Err(err),
    }
}

async fn interrupted() -> CliError {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %err, "interrupt handler unavailable");
        std::future::pending::<()>().await;
    }
    CliError::failure(anyhow!("interrupted"))
}

pub(crate) async fn dispatch(
    cli: Cli,
    client: &ArtieClient,
    out: &mut impl Write,
) -> CliResult<()> {
    match cli.command {
        Command::ListDeployments => handle_list_deployments(client, cli.output, out).await,
        Command::GetDeployment(args) => handle_get_deployment(client, args, cli.output, out).await,
        Command::CancelDeploymentBackfill(args) => handle_cancel_backfill(client, args, out).await,
        Command::DeploySourceReader(args) => handle_deploy_source_reader(client, args, out).await,
        Command::DeployDeployment(args) => handle_deploy_deployment(client, args, out).await,
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "artie",
    version,
    about = "Command-line client for the Artie deployment API"
)]
pub(crate) struct Cli {
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// List deployments visible to the API key.
    ListDeployments,
    /// Show a deployment and its tables.
    GetDeployment(GetDeploymentArgs),
    /// Cancel the backfill of specific tables in a deployment.
    CancelDeploymentBackfill(CancelBackfillArgs),
    /// Deploy a source reader.
    DeploySourceReader(DeploySourceReaderArgs),
    /// Deploy a deployment.
    DeployDeployment(DeployDeploymentArgs),
}

#[derive(Args, Debug)]
pub(crate) struct GetDeploymentArgs {
    #[arg(long, value_parser = parse_uuid, help = "UUID of the deployment to get")]
    pub(crate) deployment_uuid: Uuid,
}

#[derive(Args, Debug)]
pub(crate) struct CancelBackfillArgs {
    #[arg(
        long,
        value_parser = parse_uuid,
        help = "UUID of the deployment to cancel backfill for"
    )]
    pub(crate) deployment_uuid: Uuid,
    #[arg(
        long,
        value_parser = parse_table_uuids,
        help = "Comma-separated list of table UUIDs to cancel backfill for"
    )]
    pub(crate) table_uuids: TableUuids,
}

#[derive(Args, Debug)]
pub(crate) struct DeploySourceReaderArgs {
    #[arg(long, value_parser = parse_uuid, help = "UUID of the source reader to deploy")]
    pub(crate) source_reader_uuid: Uuid,
}

#[derive(Args, Debug)]
pub(crate) struct DeployDeploymentArgs {
    #[arg(long, value_parser = parse_uuid, help = "UUID of the deployment to deploy")]
    pub(crate) deployment_uuid: Uuid,
}

/// Non-empty list of table identifiers parsed from a comma-separated flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TableUuids(Vec<Uuid>);

impl TableUuids {
    pub(crate) fn as_slice(&self) -> &[Uuid] {
        &self.0
    }

    pub(crate) fn joined(&self) -> String {
        self.0
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) fn parse_uuid(input: &str) -> Result<Uuid, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("value must not be empty".to_string());
    }
    Uuid::parse_str(trimmed).map_err(|err| format!("invalid UUID '{trimmed}': {err}"))
}

pub(crate) fn parse_table_uuids(input: &str) -> Result<TableUuids, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("must contain at least one table UUID".to_string());
    }

    trimmed
        .split(',')
        .map(|entry| {
            if entry.trim().is_empty() {
                Err("table UUID list contains an empty entry".to_string())
            } else {
                parse_uuid(entry)
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(TableUuids)
}

/// Translate clap's parse failures into argument errors naming the offending
/// command or flag.
pub(crate) fn classify_parse_error(err: &clap::Error) -> CliError {
    match err.kind() {
        ErrorKind::InvalidSubcommand => {
            let name = context_strings(err, ContextKind::InvalidSubcommand)
                .into_iter()
                .next()
                .unwrap_or_default();
            CliError::validation(format!("unknown command: {name:?}"))
        }
        ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            CliError::validation("no command provided")
        }
        ErrorKind::MissingRequiredArgument => {
            let flags = flag_names(err);
            if flags.is_empty() {
                CliError::validation(first_error_line(err))
            } else {
                CliError::validation(format!("{} is required", flags.join(", ")))
            }
        }
        ErrorKind::ValueValidation | ErrorKind::InvalidValue => {
            let flag = flag_names(err).into_iter().next();
            let reason = std::error::Error::source(err)
                .map_or_else(|| first_error_line(err), ToString::to_string);
            match flag {
                Some(flag) => CliError::validation(format!("invalid value for {flag}: {reason}")),
                None => CliError::validation(reason),
            }
        }
        _ => CliError::validation(first_error_line(err)),
    }
}

fn context_strings(err: &clap::Error, kind: ContextKind) -> Vec<String> {
    match err.get(kind) {
        Some(ContextValue::String(value)) => vec![value.clone()],
        Some(ContextValue::Strings(values)) => values.clone(),
        _ => Vec::new(),
    }
}

/// Flag names without their value placeholders, e.g. `--deployment-uuid`.
fn flag_names(err: &clap::Error) -> Vec<String> {
    context_strings(err, ContextKind::InvalidArg)
        .iter()
        .filter_map(|arg| arg.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn first_error_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).trim().to_string()
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::ListDeployments => "list-deployments",
        Command::GetDeployment(_) => "get-deployment",
        Command::CancelDeploymentBackfill(_) => "cancel-deployment-backfill",
        Command::DeploySourceReader(_) => "deploy-source-reader",
        Command::DeployDeployment(_) => "deploy-deployment",
    }
}
