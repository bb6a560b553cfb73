use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::hub::{ChangeEvent, ChangeHub, ChangeKind, Subscription, SubscriptionId};
use super::query::{Select, Table};
use super::{AuthService, BackendError, DataService, RealtimeService};
use crate::models::Session;

/// Client for a hosted PostgREST-style backend (`/rest/v1/<table>` for rows,
/// `/auth/v1/user` for the session).
///
/// The hosted change feed is not consumed; change events are published for
/// writes made through this client only.
pub struct RestBackend {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
    hub: Arc<ChangeHub>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

impl RestBackend {
    pub fn new(base_url: String, api_key: String, access_token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token,
            client: reqwest::Client::new(),
            hub: Arc::new(ChangeHub::default()),
        }
    }

    pub fn hub(&self) -> &Arc<ChangeHub> {
        &self.hub
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let res = builder.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json().await?)
    }
}

/// PostgREST returns the affected rows as an array even for a single row.
fn first_row(value: Value, table: Table, id: &str) -> Result<Value, BackendError> {
    match value {
        Value::Array(rows) => rows
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("{} {id}", table.as_str()))),
        other => Ok(other),
    }
}

#[async_trait]
impl AuthService for RestBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(token) = &self.access_token else {
            return Ok(None);
        };

        let url = format!("{}/auth/v1/user", self.base_url);
        let res = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        if res.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let user: AuthUser = res.json().await?;
        Ok(Some(Session { user_id: user.id }))
    }
}

#[async_trait]
impl DataService for RestBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError> {
        let url = self.table_url(query.table);
        let builder = self
            .request(reqwest::Method::GET, &url)
            .query(&query.to_query_pairs());

        match self.send(builder).await? {
            Value::Array(rows) => Ok(rows),
            other => Err(BackendError::InvalidQuery(format!(
                "expected an array of rows, got {other}"
            ))),
        }
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, BackendError> {
        let url = self.table_url(table);
        let builder = self
            .request(reqwest::Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(&row);

        let inserted = first_row(self.send(builder).await?, table, "new row")?;
        self.hub.publish(ChangeEvent {
            table,
            kind: ChangeKind::Insert,
            record: inserted.clone(),
        });
        Ok(inserted)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<(), BackendError> {
        let url = self.table_url(table);
        let filter = format!("eq.{id}");
        let builder = self
            .request(reqwest::Method::PATCH, &url)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&patch);

        let record = first_row(self.send(builder).await?, table, id)?;
        self.hub.publish(ChangeEvent {
            table,
            kind: ChangeKind::Update,
            record,
        });
        Ok(())
    }
}

impl RealtimeService for RestBackend {
    fn subscribe(&self, table: Table, kinds: &[ChangeKind]) -> Subscription {
        self.hub.subscribe(table, kinds)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }
}
