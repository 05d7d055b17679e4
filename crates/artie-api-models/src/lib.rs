#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Artie deployment API.
//!
//! Field names follow the server's camelCase JSON contract. Absent scalar
//! fields decode to their defaults so partially populated payloads still
//! render; malformed or mistyped values are decode errors.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Reason attached to backfill cancellations issued from the CLI.
pub const CANCEL_BACKFILL_REASON: &str = "Done through Artie CLI";

/// Snapshot of a deployment as returned by the list and detail endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Deployment {
    /// Deployment identifier.
    pub uuid: Uuid,
    /// Name of the data plane hosting the deployment.
    pub data_plane_name: String,
    /// Human-readable deployment name.
    pub name: String,
    /// Timestamp of the most recent configuration change.
    pub last_updated_at: DateTime<Utc>,
    /// Server-reported status label.
    pub status: String,
    /// Whether the deployment has edits that were not deployed yet.
    pub has_undeployed_changes: bool,
}

/// Table tracked by a deployment's source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Table {
    /// Table identifier.
    pub uuid: Uuid,
    /// Schema the table lives in.
    pub schema: String,
    /// Table name within the schema.
    pub name: String,
    /// Timestamp the table was added to the deployment.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest table change.
    pub updated_at: DateTime<Utc>,
    /// Whether a backfill is currently running for the table.
    pub is_backfilling: bool,
}

impl Table {
    /// Schema-qualified name, e.g. `public.orders`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

/// Ordered set of tables read by a deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Source {
    /// Tables in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<Table>,
}

/// Deployment detail: the deployment fields plus its source.
///
/// The deployment fields share the JSON object with `source`; the flattening
/// is explicit so no field promotion happens on the Rust side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FullDeployment {
    /// Deployment fields, flattened into the enclosing object.
    #[serde(flatten)]
    pub deployment: Deployment,
    /// Source holding the deployment's tables.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
}

/// Response payload for `GET /deployments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListDeploymentsResponse {
    /// Deployments visible to the API key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Deployment>,
}

/// Response payload for `GET /deployments/{uuid}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetDeploymentResponse {
    /// The requested deployment including its source.
    pub deployment: FullDeployment,
}

/// Request body for `POST /deployments/{uuid}/backfill/cancel`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CancelBackfillRequest {
    /// Free-form reason recorded by the server.
    pub optional_reason: String,
    /// Tables whose backfill should be cancelled.
    #[serde(rename = "tableUUIDs")]
    pub table_uuids: Vec<Uuid>,
}

impl CancelBackfillRequest {
    /// Build a cancellation request carrying the CLI's standard reason.
    #[must_use]
    pub fn new(table_uuids: Vec<Uuid>) -> Self {
        Self {
            optional_reason: CANCEL_BACKFILL_REASON.to_string(),
            table_uuids,
        }
    }
}

/// Servers encode empty collections as `null`; treat that like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
