//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;

use anyhow::anyhow;
use artie_api_models::{Deployment, FullDeployment, ListDeploymentsResponse, Table};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Frames every rendered response.
pub(crate) const SEPARATOR: &str = "--------------------------------";

pub(crate) fn render_deployment_list(
    list: &ListDeploymentsResponse,
    format: OutputFormat,
) -> CliResult<String> {
    let mut lines = vec![SEPARATOR.to_string()];
    for (index, deployment) in list.items.iter().enumerate() {
        match format {
            OutputFormat::Json => lines.push(to_json_line(deployment)?),
            OutputFormat::Table => {
                if index > 0 {
                    lines.push(String::new());
                }
                lines.extend(deployment_block(deployment));
            }
        }
    }
    lines.push(SEPARATOR.to_string());
    Ok(join_lines(&lines))
}

pub(crate) fn render_deployment_detail(
    detail: &FullDeployment,
    format: OutputFormat,
) -> CliResult<String> {
    let mut lines = vec![SEPARATOR.to_string(), "Deployment:".to_string()];
    match format {
        OutputFormat::Json => lines.push(to_json_line(&detail.deployment)?),
        OutputFormat::Table => lines.extend(deployment_block(&detail.deployment)),
    }

    lines.push("Tables:".to_string());
    for table in &detail.source.tables {
        match format {
            OutputFormat::Json => lines.push(to_json_line(table)?),
            OutputFormat::Table => lines.extend(table_block(table)),
        }
    }
    lines.push(SEPARATOR.to_string());
    Ok(join_lines(&lines))
}

/// Write rendered text to the command's output stream.
pub(crate) fn emit(out: &mut impl Write, text: &str) -> CliResult<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

fn deployment_block(deployment: &Deployment) -> Vec<String> {
    vec![
        format!("uuid: {}", deployment.uuid),
        format!("name: {}", deployment.name),
        format!("data plane: {}", deployment.data_plane_name),
        format!("status: {}", deployment.status),
        format!("last updated: {}", deployment.last_updated_at.to_rfc3339()),
        format!(
            "undeployed changes: {}",
            yes_no(deployment.has_undeployed_changes)
        ),
    ]
}

fn table_block(table: &Table) -> Vec<String> {
    vec![
        format!("- {}", table.qualified_name()),
        format!("  uuid: {}", table.uuid),
        format!("  backfilling: {}", yes_no(table.is_backfilling)),
        format!("  created: {}", table.created_at.to_rfc3339()),
        format!("  updated: {}", table.updated_at.to_rfc3339()),
    ]
}

fn to_json_line<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
