//! HTTP snapshot store
//!
//! Client for a remote snapshot service exposing `/snapshots` and
//! `/settings`. Every call goes to the server; nothing is cached locally.

use super::SnapshotStore;
use crate::error::{AppError, Result};
use crate::snapshot::{
    NewSnapshot, Snapshot, SnapshotListItem, SnapshotSettings, SnapshotSettingsUpdate,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

/// Response body of `POST /snapshots`
#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: i64,
}

/// Error body returned by the service on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Snapshot store backed by a remote HTTP service
#[derive(Clone)]
pub struct HttpSnapshotStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSnapshotStore {
    /// * `base_url` - service root, e.g. `https://host/api/ultra-card`
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        self.authorize(request).send().await.map_err(|e| {
            tracing::warn!("Snapshot service request failed: {}", e);
            AppError::Persistence(format!("Snapshot service unreachable: {}", e))
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        ensure_success(self.dispatch(request).await?).await
    }

    /// Like [`send`](Self::send) but maps 404 to `SnapshotNotFound`
    async fn send_for_snapshot(&self, id: i64, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = self.dispatch(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::SnapshotNotFound(id));
        }
        ensure_success(response).await
    }
}

/// Turn a non-2xx response into `AppError::Persistence`
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(AppError::Persistence(error_message(status, &body)))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response.json().await.map_err(|e| {
        AppError::Persistence(format!("Invalid response from snapshot service: {}", e))
    })
}

/// Prefer the server's `message` field, fall back to the raw body
fn error_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => format!("Snapshot service returned {}", status),
        None => format!("Snapshot service returned {}: {}", status, body.trim()),
    }
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
    async fn create_snapshot(&self, snapshot: &NewSnapshot) -> Result<i64> {
        let response = self
            .send(self.client.post(self.url("snapshots")).json(snapshot))
            .await?;
        let created: CreatedResponse = decode(response).await?;

        tracing::info!(
            "Stored {} snapshot {} remotely ({} cards)",
            snapshot.kind,
            created.id,
            snapshot.card_count
        );
        Ok(created.id)
    }

    async fn list_snapshots(&self, limit: u32) -> Result<Vec<SnapshotListItem>> {
        let response = self
            .send(
                self.client
                    .get(self.url("snapshots"))
                    .query(&[("limit", limit)]),
            )
            .await?;
        decode(response).await
    }

    async fn get_snapshot(&self, id: i64) -> Result<Snapshot> {
        let response = self
            .send_for_snapshot(id, self.client.get(self.url(&format!("snapshots/{}", id))))
            .await?;
        decode(response).await
    }

    async fn delete_snapshot(&self, id: i64) -> Result<()> {
        self.send_for_snapshot(
            id,
            self.client.delete(self.url(&format!("snapshots/{}", id))),
        )
        .await?;
        tracing::info!("Deleted remote snapshot {}", id);
        Ok(())
    }

    async fn rename_snapshot(&self, id: i64, label: &str) -> Result<()> {
        self.send_for_snapshot(
            id,
            self.client
                .patch(self.url(&format!("snapshots/{}", id)))
                .json(&json!({ "label": label })),
        )
        .await?;
        Ok(())
    }

    async fn get_settings(&self) -> Result<SnapshotSettings> {
        let response = self.send(self.client.get(self.url("settings"))).await?;
        decode(response).await
    }

    async fn update_settings(&self, update: &SnapshotSettingsUpdate) -> Result<SnapshotSettings> {
        let response = self
            .send(self.client.patch(self.url("settings")).json(update))
            .await?;
        decode(response).await
    }
}
