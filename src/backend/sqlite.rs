use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use serde_json::Value;

use super::hub::{ChangeEvent, ChangeHub, ChangeKind, Subscription, SubscriptionId};
use super::query::{Select, Table};
use super::{AuthService, BackendError, DataService, RealtimeService};
use crate::db::queries;
use crate::models::Session;

/// Embedded SQLite store. Every write it performs is published on its
/// [`ChangeHub`], so subscribers see inserts and updates from any screen
/// sharing the same backend.
pub struct SqliteBackend {
    db: Arc<Mutex<Connection>>,
    hub: Arc<ChangeHub>,
    session_user: Mutex<Option<String>>,
}

impl SqliteBackend {
    pub fn new(conn: Connection, session_user: Option<String>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            hub: Arc::new(ChangeHub::default()),
            session_user: Mutex::new(session_user),
        }
    }

    pub fn hub(&self) -> &Arc<ChangeHub> {
        &self.hub
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        *self.session_user.lock().unwrap() = Some(user_id.into());
    }

    pub fn sign_out(&self) {
        *self.session_user.lock().unwrap() = None;
    }

    /// Deletes a row and publishes the change. Screens never delete, but
    /// other writers sharing the store do.
    pub fn delete(&self, table: Table, id: &str) -> Result<bool, BackendError> {
        let removed = {
            let db = self.db.lock().unwrap();
            let row = queries::get_row(&db, table, id)?;
            let sql = format!("DELETE FROM {} WHERE id = ?1", table.as_str());
            db.execute(&sql, [id])?;
            row
        };

        match removed {
            Some(record) => {
                self.hub.publish(ChangeEvent {
                    table,
                    kind: ChangeKind::Delete,
                    record: Value::Object(record),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AuthService for SqliteBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let user_id = self.session_user.lock().unwrap().clone();
        Ok(user_id.map(|user_id| Session { user_id }))
    }
}

#[async_trait]
impl DataService for SqliteBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError> {
        let db = self.db.lock().unwrap();
        queries::select(&db, query)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, BackendError> {
        let inserted = {
            let db = self.db.lock().unwrap();
            queries::insert(&db, table, &row)?
        };

        self.hub.publish(ChangeEvent {
            table,
            kind: ChangeKind::Insert,
            record: inserted.clone(),
        });
        Ok(inserted)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<(), BackendError> {
        let updated = {
            let db = self.db.lock().unwrap();
            queries::update(&db, table, id, &patch)?
        };

        let record =
            updated.ok_or_else(|| BackendError::NotFound(format!("{} {id}", table.as_str())))?;
        self.hub.publish(ChangeEvent {
            table,
            kind: ChangeKind::Update,
            record,
        });
        Ok(())
    }
}

impl RealtimeService for SqliteBackend {
    fn subscribe(&self, table: Table, kinds: &[ChangeKind]) -> Subscription {
        self.hub.subscribe(table, kinds)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }
}
