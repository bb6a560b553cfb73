pub mod hub;
pub mod query;
pub mod rest;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::models::Session;

pub use hub::{ChangeEvent, ChangeHub, ChangeKind, Subscription, SubscriptionId};
pub use query::{Column, Filter, Order, Relation, Select, Table};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// `Ok(None)` means the lookup worked and nobody is signed in.
    async fn current_session(&self) -> Result<Option<Session>, BackendError>;
}

#[async_trait]
pub trait DataService: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Vec<serde_json::Value>, BackendError>;

    /// Inserts one row and returns it as stored.
    async fn insert(
        &self,
        table: Table,
        row: serde_json::Value,
    ) -> Result<serde_json::Value, BackendError>;

    async fn update(
        &self,
        table: Table,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), BackendError>;
}

pub trait RealtimeService: Send + Sync {
    fn subscribe(&self, table: Table, kinds: &[ChangeKind]) -> Subscription;
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

impl RealtimeService for ChangeHub {
    fn subscribe(&self, table: Table, kinds: &[ChangeKind]) -> Subscription {
        ChangeHub::subscribe(self, table, kinds)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        ChangeHub::unsubscribe(self, id)
    }
}

/// The three collaborators a screen talks to.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthService>,
    pub data: Arc<dyn DataService>,
    pub realtime: Arc<dyn RealtimeService>,
}

impl Backend {
    /// One object serving all three roles, e.g. [`sqlite::SqliteBackend`].
    pub fn from_shared<B>(backend: Arc<B>) -> Self
    where
        B: AuthService + DataService + RealtimeService + 'static,
    {
        Self {
            auth: backend.clone(),
            data: backend.clone(),
            realtime: backend,
        }
    }
}

pub async fn select_as<T: DeserializeOwned>(
    data: &dyn DataService,
    query: &Select,
) -> Result<Vec<T>, BackendError> {
    let rows = data.select(query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}
