use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use crate::backend::{ChangeEvent, ChangeKind, RealtimeService, SubscriptionId, Table};
use crate::services::mutations::record_id;

/// Owns the realtime subscription on `bookings`. Dropping the listener (or
/// calling [`ChangeListener::release`]) stops the task and unsubscribes,
/// exactly once.
pub struct ChangeListener {
    realtime: Arc<dyn RealtimeService>,
    subscription: Option<SubscriptionId>,
    task: JoinHandle<()>,
}

impl ChangeListener {
    /// Subscribes to every insert, update and delete on `bookings` and runs
    /// `on_change` for each event. Each call runs as its own task; a slow
    /// handler never delays the next event.
    pub fn install<F, Fut>(realtime: Arc<dyn RealtimeService>, on_change: F) -> Self
    where
        F: Fn(ChangeEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let subscription = realtime.subscribe(Table::Bookings, &ChangeKind::ALL);
        let id = subscription.id;
        let mut events = Box::pin(subscription.into_stream());

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                tracing::debug!(
                    kind = ?event.kind,
                    booking_id = record_id(&event.record).unwrap_or("-"),
                    "booking change received"
                );
                tokio::spawn(on_change(event));
            }
        });

        Self {
            realtime,
            subscription: Some(id),
            task,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.task.abort();
            self.realtime.unsubscribe(id);
            tracing::debug!("change listener released");
        }
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}
