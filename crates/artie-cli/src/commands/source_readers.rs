use std::io::Write;

use reqwest::Method;

use crate::cli::DeploySourceReaderArgs;
use crate::client::{ArtieClient, CliError, CliResult};
use crate::output::emit;

pub(crate) async fn handle_deploy_source_reader(
    client: &ArtieClient,
    args: DeploySourceReaderArgs,
    out: &mut impl Write,
) -> CliResult<()> {
    let id = args.source_reader_uuid;
    client
        .send_request(Method::POST, &format!("/source-readers/{id}/deploy"), None)
        .await
        .map_err(|err| CliError::request("deploy source reader", &err))?;

    tracing::info!(source_reader_uuid = %id, "Source reader deployed");
    emit(out, &format!("Source reader deployment requested (id: {id})\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_client;
    use httpmock::prelude::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn deploy_source_reader_posts_to_deploy_endpoint() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let mock = server.mock(move |when, then| {
            when.method(POST)
                .path(format!("/source-readers/{id}/deploy"))
                .header("authorization", "Bearer test-key")
                .header("content-type", "application/json");
            then.status(200);
        });

        let client = test_client(&server.base_url());
        let mut out = Vec::new();
        handle_deploy_source_reader(
            &client,
            DeploySourceReaderArgs {
                source_reader_uuid: id,
            },
            &mut out,
        )
        .await
        .expect("deploy should succeed");
        mock.assert();
        assert!(String::from_utf8_lossy(&out).contains(&id.to_string()));
    }

    #[tokio::test]
    async fn deploy_source_reader_wraps_status_errors() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        server.mock(move |when, then| {
            when.method(POST).path(format!("/source-readers/{id}/deploy"));
            then.status(404).body("source reader not found");
        });

        let client = test_client(&server.base_url());
        let err = handle_deploy_source_reader(
            &client,
            DeploySourceReaderArgs {
                source_reader_uuid: id,
            },
            &mut Vec::<u8>::new(),
        )
        .await
        .expect_err("404 should fail");
        let message = err.display_message();
        assert!(message.starts_with("failed to deploy source reader: non-200 status code: 404"));
        assert!(message.contains("source reader not found"));
    }
}
