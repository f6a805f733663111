use std::time::Duration;

use anyhow::{Context as _, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::config::FirestoreConfig;
use crate::domain::repository::CloudStore;
use crate::domain::types::{RemoteDocument, synced_at_millis};
use crate::error::SyncServiceError;
use crate::infra::cloud::codec::{decode_fields, encode_fields};

const SYNCED_AT: &str = "synced_at";

/// Firestore REST v1 client.
#[derive(Debug, Clone)]
pub struct FirestoreCloudStore {
    client: reqwest::Client,
    base_url: String,
    /// `projects/{project}/databases/{database}/documents`
    documents_path: String,
    access_token: Option<String>,
}

impl FirestoreCloudStore {
    pub fn new(config: &FirestoreConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build firestore http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            documents_path: format!(
                "projects/{}/databases/{}/documents",
                config.project_id, config.database
            ),
            access_token: config.access_token.clone(),
        })
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_path)
    }

    async fn post(&self, action: &str, body: &Value) -> Result<reqwest::Response, SyncServiceError> {
        let url = format!("{}/{}:{action}", self.base_url, self.documents_path);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("firestore {action} request"))
            .map_err(SyncServiceError::Unavailable)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let error = anyhow!(
            "firestore {action} failed with HTTP {}: {}",
            status.as_u16(),
            compact_body(&body)
        );
        // Rejected requests will not succeed on retry; everything else might.
        if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(SyncServiceError::Internal(error))
        } else {
            Err(SyncServiceError::Unavailable(error))
        }
    }
}

impl CloudStore for FirestoreCloudStore {
    async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), SyncServiceError> {
        let mut fields = data.as_object().cloned().unwrap_or_default();
        // The server-side transform owns this field.
        fields.remove(SYNCED_AT);
        let body = json!({
            "writes": [{
                "update": {
                    "name": self.document_name(collection, id),
                    "fields": encode_fields(&fields),
                },
                "updateTransforms": [{
                    "fieldPath": SYNCED_AT,
                    "setToServerValue": "REQUEST_TIME",
                }],
            }],
        });
        self.post("commit", &body).await?;
        Ok(())
    }

    async fn changed_since(
        &self,
        collection: &str,
        since_ms: i64,
    ) -> Result<Vec<RemoteDocument>, SyncServiceError> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": SYNCED_AT },
                        "op": "GREATER_THAN",
                        "value": { "timestampValue": query_bound(since_ms) },
                    },
                },
                "orderBy": [{
                    "field": { "fieldPath": SYNCED_AT },
                    "direction": "ASCENDING",
                }],
            },
        });
        let rows: Vec<RunQueryRow> = self
            .post("runQuery", &body)
            .await?
            .json()
            .await
            .context("decode firestore runQuery response")
            .map_err(SyncServiceError::Unavailable)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.document)
            .filter_map(|doc| {
                let data = decode_fields(&doc.fields);
                let synced_at_ms = data.get(SYNCED_AT).and_then(synced_at_millis)?;
                let id = doc.name.rsplit('/').next()?.to_owned();
                Some(RemoteDocument {
                    id,
                    data: Value::Object(data),
                    synced_at_ms,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Lower bound for `synced_at > since_ms`.
///
/// Server timestamps carry microseconds while the watermark keeps whole
/// milliseconds, so the bound is the last microsecond of `since_ms`. A
/// document already applied at `since_ms` is then not returned again.
fn query_bound(since_ms: i64) -> String {
    let bound = DateTime::<Utc>::from_timestamp_millis(since_ms).unwrap_or_default()
        + chrono::Duration::microseconds(999);
    bound.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn compact_body(body: &str) -> String {
    body.trim().chars().take(180).collect()
}
