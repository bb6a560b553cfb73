use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use super::query::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete];
}

/// A row-level change notification for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub record: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A live subscription. The stream only yields events for the subscribed
/// table and kinds; lagged receivers skip what they missed.
pub struct Subscription {
    pub id: SubscriptionId,
    table: Table,
    kinds: Vec<ChangeKind>,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        let table = self.table;
        let kinds = self.kinds;
        BroadcastStream::new(self.rx).filter_map(move |result| match result {
            Ok(event) if event.table == table && kinds.contains(&event.kind) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, table = table.as_str(), "change subscription lagged");
                None
            }
        })
    }
}

/// Fan-out point for change events, shared by the backends.
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
    next_id: AtomicU64,
    active: Mutex<HashMap<SubscriptionId, Table>>,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self, table: Table, kinds: &[ChangeKind]) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.active.lock().unwrap().insert(id, table);
        tracing::debug!(subscription = id.0, table = table.as_str(), "realtime subscribed");
        Subscription {
            id,
            table,
            kinds: kinds.to_vec(),
            rx: self.tx.subscribe(),
        }
    }

    /// Returns false if the handle was unknown or already released.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.active.lock().unwrap().remove(&id).is_some();
        if removed {
            tracing::debug!(subscription = id.0, "realtime unsubscribed");
        }
        removed
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active.lock().unwrap().len()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(table: Table, kind: ChangeKind) -> ChangeEvent {
        ChangeEvent {
            table,
            kind,
            record: serde_json::json!({"id": "x"}),
        }
    }

    #[tokio::test]
    async fn test_subscription_filters_table_and_kind() {
        let hub = ChangeHub::default();
        let sub = hub.subscribe(Table::Bookings, &[ChangeKind::Update]);
        let mut stream = Box::pin(sub.into_stream());

        hub.publish(event(Table::Services, ChangeKind::Update));
        hub.publish(event(Table::Bookings, ChangeKind::Insert));
        hub.publish(event(Table::Bookings, ChangeKind::Update));

        let got = stream.next().await.unwrap();
        assert_eq!(got.table, Table::Bookings);
        assert_eq!(got.kind, ChangeKind::Update);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let hub = ChangeHub::default();
        let sub = hub.subscribe(Table::Bookings, &ChangeKind::ALL);
        assert_eq!(hub.active_subscriptions(), 1);
        assert!(hub.unsubscribe(sub.id));
        assert!(!hub.unsubscribe(sub.id));
        assert_eq!(hub.active_subscriptions(), 0);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = ChangeHub::default();
        hub.publish(event(Table::Bookings, ChangeKind::Delete));
        assert_eq!(hub.active_subscriptions(), 0);
    }
}
