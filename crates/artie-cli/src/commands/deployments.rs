use std::io::Write;

use anyhow::anyhow;
use artie_api_models::{CancelBackfillRequest, GetDeploymentResponse, ListDeploymentsResponse};
use reqwest::Method;

use crate::cli::{CancelBackfillArgs, DeployDeploymentArgs, GetDeploymentArgs, OutputFormat};
use crate::client::{ArtieClient, CliError, CliResult, json_body};
use crate::output::{emit, render_deployment_detail, render_deployment_list};

pub(crate) async fn handle_list_deployments(
    client: &ArtieClient,
    output: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let body = client
        .send_request(Method::GET, "/deployments", None)
        .await
        .map_err(|err| CliError::request("list deployments", &err))?;

    let list = serde_json::from_slice::<ListDeploymentsResponse>(&body)
        .map_err(|err| CliError::failure(anyhow!("failed to parse deployment list: {err}")))?;
    emit(out, &render_deployment_list(&list, output)?)
}

pub(crate) async fn handle_get_deployment(
    client: &ArtieClient,
    args: GetDeploymentArgs,
    output: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let id = args.deployment_uuid;
    let body = client
        .send_request(Method::GET, &format!("/deployments/{id}"), None)
        .await
        .map_err(|err| CliError::request(&format!("get deployment {id}"), &err))?;

    let response = serde_json::from_slice::<GetDeploymentResponse>(&body)
        .map_err(|err| CliError::failure(anyhow!("failed to parse deployment {id}: {err}")))?;
    emit(out, &render_deployment_detail(&response.deployment, output)?)
}

pub(crate) async fn handle_cancel_backfill(
    client: &ArtieClient,
    args: CancelBackfillArgs,
    out: &mut impl Write,
) -> CliResult<()> {
    let id = args.deployment_uuid;
    let request = CancelBackfillRequest::new(args.table_uuids.as_slice().to_vec());
    let payload = json_body(&request)
        .map_err(|err| CliError::request("cancel deployment backfill", &err))?;

    client
        .send_request(
            Method::POST,
            &format!("/deployments/{id}/backfill/cancel"),
            Some(payload),
        )
        .await
        .map_err(|err| CliError::request("cancel deployment backfill", &err))?;

    let tables = args.table_uuids.joined();
    tracing::info!(deployment_uuid = %id, table_uuids = %tables, "Deployment backfill cancelled");
    emit(
        out,
        &format!(
            "Backfill cancellation requested (deployment: {id}, tables: {})\n",
            request.table_uuids.len()
        ),
    )
}

pub(crate) async fn handle_deploy_deployment(
    client: &ArtieClient,
    args: DeployDeploymentArgs,
    out: &mut impl Write,
) -> CliResult<()> {
    let id = args.deployment_uuid;
    client
        .send_request(Method::POST, &format!("/deployments/{id}/deploy"), None)
        .await
        .map_err(|err| CliError::request("deploy deployment", &err))?;

    tracing::info!(deployment_uuid = %id, "Deployment deployed");
    emit(out, &format!("Deployment requested (id: {id})\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{TableUuids, parse_table_uuids};
    use crate::client::test_client;
    use crate::output::SEPARATOR;
    use artie_api_models::CANCEL_BACKFILL_REASON;
    use httpmock::prelude::*;
    use serde_json::json;
    use uuid::Uuid;

    fn table_uuids(ids: &[Uuid]) -> TableUuids {
        let csv = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        parse_table_uuids(&csv).expect("valid table list")
    }

    #[tokio::test]
    async fn list_deployments_decodes_and_frames_items() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let mock = server.mock(move |when, then| {
            when.method(GET)
                .path("/deployments")
                .header("authorization", "Bearer test-key");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "items": [{
                        "uuid": id,
                        "dataPlaneName": "aws-us-east-1",
                        "name": "orders",
                        "lastUpdatedAt": "2024-05-01T12:30:00Z",
                        "status": "active",
                        "hasUndeployedChanges": false
                    }]
                }));
        });

        let client = test_client(&server.base_url());
        let mut out = Vec::new();
        handle_list_deployments(&client, OutputFormat::Table, &mut out)
            .await
            .expect("list should succeed");
        mock.assert();

        let text = String::from_utf8(out).expect("utf-8 output");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.first(), Some(&SEPARATOR));
        assert_eq!(lines.last(), Some(&SEPARATOR));
        assert_eq!(lines.iter().filter(|line| line.starts_with("name: ")).count(), 1);
        assert!(lines.contains(&"name: orders"));
        assert!(text.contains(&id.to_string()));
    }

    #[tokio::test]
    async fn list_deployments_reports_malformed_json() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/deployments");
            then.status(200).body("{\"items\": [");
        });

        let client = test_client(&server.base_url());
        let err = handle_list_deployments(&client, OutputFormat::Table, &mut Vec::<u8>::new())
            .await
            .expect_err("malformed JSON should fail");
        assert!(err.display_message().contains("failed to parse deployment list"));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn list_deployments_surfaces_status_body() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/deployments");
            then.status(401).body("missing credentials");
        });

        let client = test_client(&server.base_url());
        let err = handle_list_deployments(&client, OutputFormat::Json, &mut Vec::<u8>::new())
            .await
            .expect_err("401 should fail");
        let message = err.display_message();
        assert!(message.contains("non-200 status code: 401"));
        assert!(message.contains("missing credentials"));
    }

    #[tokio::test]
    async fn get_deployment_prints_table_blocks() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let mock = server.mock(move |when, then| {
            when.method(GET).path(format!("/deployments/{id}"));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "deployment": {
                        "uuid": id,
                        "name": "orders",
                        "status": "active",
                        "source": {
                            "tables": [
                                {"uuid": Uuid::new_v4(), "schema": "public", "name": "orders", "isBackfilling": true},
                                {"uuid": Uuid::new_v4(), "schema": "public", "name": "customers"},
                                {"uuid": Uuid::new_v4(), "schema": "sales", "name": "refunds"},
                                {"uuid": Uuid::new_v4(), "schema": "sales", "name": "invoices"}
                            ]
                        }
                    }
                }));
        });

        let client = test_client(&server.base_url());
        let mut out = Vec::new();
        handle_get_deployment(
            &client,
            GetDeploymentArgs { deployment_uuid: id },
            OutputFormat::Table,
            &mut out,
        )
        .await
        .expect("get should succeed");
        mock.assert();

        let text = String::from_utf8(out).expect("utf-8 output");
        let (deployment_part, tables_part) =
            text.split_once("Tables:\n").expect("tables section present");
        assert!(deployment_part.contains("Deployment:\nuuid: "));
        assert!(deployment_part.contains("name: orders"));
        assert_eq!(
            tables_part.lines().filter(|line| line.starts_with("- ")).count(),
            4
        );
        assert!(tables_part.contains("- sales.invoices"));
    }

    #[tokio::test]
    async fn get_deployment_requires_deployment_object() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        server.mock(move |when, then| {
            when.method(GET).path(format!("/deployments/{id}"));
            then.status(200).json_body(json!({"items": []}));
        });

        let client = test_client(&server.base_url());
        let err = handle_get_deployment(
            &client,
            GetDeploymentArgs { deployment_uuid: id },
            OutputFormat::Table,
            &mut Vec::<u8>::new(),
        )
        .await
        .expect_err("missing deployment should fail");
        assert!(err.display_message().contains(&format!("failed to parse deployment {id}")));
    }

    #[tokio::test]
    async fn cancel_backfill_posts_reason_and_tables() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let tables = [Uuid::new_v4(), Uuid::new_v4()];
        let mock = server.mock(move |when, then| {
            when.method(POST)
                .path(format!("/deployments/{id}/backfill/cancel"))
                .header("authorization", "Bearer test-key")
                .json_body(json!({
                    "optionalReason": CANCEL_BACKFILL_REASON,
                    "tableUUIDs": tables
                }));
            then.status(200);
        });

        let client = test_client(&server.base_url());
        let mut out = Vec::new();
        handle_cancel_backfill(
            &client,
            CancelBackfillArgs {
                deployment_uuid: id,
                table_uuids: table_uuids(&tables),
            },
            &mut out,
        )
        .await
        .expect("cancel should succeed");
        mock.assert();
        assert!(String::from_utf8_lossy(&out).contains("tables: 2"));
    }

    #[tokio::test]
    async fn cancel_backfill_includes_response_text_on_failure() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        server.mock(move |when, then| {
            when.method(POST).path(format!("/deployments/{id}/backfill/cancel"));
            then.status(409).body("no backfill in progress");
        });

        let client = test_client(&server.base_url());
        let err = handle_cancel_backfill(
            &client,
            CancelBackfillArgs {
                deployment_uuid: id,
                table_uuids: table_uuids(&[Uuid::new_v4()]),
            },
            &mut Vec::<u8>::new(),
        )
        .await
        .expect_err("409 should fail");
        let message = err.display_message();
        assert!(message.starts_with("failed to cancel deployment backfill"));
        assert!(message.contains("no backfill in progress"));
        assert!(matches!(err, CliError::Failure(_)));
    }

    #[tokio::test]
    async fn deploy_deployment_posts_without_body() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let mock = server.mock(move |when, then| {
            when.method(POST).path(format!("/deployments/{id}/deploy"));
            then.status(200).body("ignored");
        });

        let client = test_client(&server.base_url());
        let mut out = Vec::new();
        handle_deploy_deployment(&client, DeployDeploymentArgs { deployment_uuid: id }, &mut out)
            .await
            .expect("deploy should succeed");
        mock.assert();
        assert!(!String::from_utf8_lossy(&out).contains("ignored"));
    }

    #[tokio::test]
    async fn deploy_deployment_wraps_failures() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        server.mock(move |when, then| {
            when.method(POST).path(format!("/deployments/{id}/deploy"));
            then.status(500);
        });

        let client = test_client(&server.base_url());
        let err = handle_deploy_deployment(
            &client,
            DeployDeploymentArgs { deployment_uuid: id },
            &mut Vec::<u8>::new(),
        )
        .await
        .expect_err("500 should fail");
        assert!(err.display_message().starts_with("failed to deploy deployment: non-200 status code: 500"));
    }
}
