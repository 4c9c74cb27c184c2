//! Domain event publisher backed by a bounded `tokio::sync::mpsc` channel.
//!
//! A single worker task drains the channel and hands each event to every
//! registered [`DomainEventHandler`]. The publishing request's [`TraceId`]
//! travels with the event so handler errors correlate with the sync that
//! caused them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::ports::{DomainEventHandler, DomainEventPublisher, DomainEventPublisherError};
use crate::domain::{DomainEvent, TraceId};

/// Events buffered before publishers wait for the worker.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1_024;

struct Envelope {
    event: DomainEvent,
    trace_id: TraceId,
}

/// Publisher half of the in-process event channel.
#[derive(Clone)]
pub struct ChannelDomainEventPublisher {
    sender: mpsc::Sender<Envelope>,
}

impl ChannelDomainEventPublisher {
    /// Create the channel and spawn its worker on the current runtime.
    ///
    /// The worker stops once every publisher clone has been dropped.
    pub fn spawn(
        handlers: Vec<Arc<dyn DomainEventHandler>>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(receiver, handlers));
        (Self { sender }, worker)
    }
}

#[async_trait]
impl DomainEventPublisher for ChannelDomainEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), DomainEventPublisherError> {
        let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
        debug!(event_type = event.event_type(), %trace_id, "publishing domain event");
        self.sender
            .send(Envelope { event, trace_id })
            .await
            .map_err(|_| DomainEventPublisherError::unavailable("event worker has stopped"))
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<Envelope>,
    handlers: Vec<Arc<dyn DomainEventHandler>>,
) {
    while let Some(Envelope { event, trace_id }) = receiver.recv().await {
        TraceId::scope(trace_id, dispatch(&event, &handlers)).await;
    }
    debug!("domain event channel closed");
}

async fn dispatch(event: &DomainEvent, handlers: &[Arc<dyn DomainEventHandler>]) {
    if let DomainEvent::ItemsSynced(synced) = event {
        info!(
            extension_id = %synced.extension_id,
            user_uuid = %synced.user_uuid,
            items = synced.item_uuids.len(),
            "extension notified of synced items"
        );
    }
    for handler in handlers {
        if let Err(err) = handler.handle(event).await {
            error!(
                event_type = event.event_type(),
                trace_id = ?TraceId::current(),
                error = %err.message(),
                "domain event handler failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockDomainEventHandler;
    use crate::domain::{DuplicateItemSynced, Error, UserId};
    use uuid::Uuid;

    fn duplicate_event() -> DomainEvent {
        DomainEvent::DuplicateItemSynced(DuplicateItemSynced {
            item_uuid: Uuid::new_v4(),
            user_uuid: UserId::random(),
        })
    }

    #[tokio::test]
    async fn events_reach_every_handler() {
        let event = duplicate_event();
        let expected = event.clone();
        let mut first = MockDomainEventHandler::new();
        first
            .expect_handle()
            .withf(move |received| *received == expected)
            .times(1)
            .returning(|_| Ok(()));
        let mut second = MockDomainEventHandler::new();
        second.expect_handle().times(1).returning(|_| Ok(()));

        let (publisher, worker) = ChannelDomainEventPublisher::spawn(
            vec![Arc::new(first), Arc::new(second)],
            DEFAULT_EVENT_CHANNEL_CAPACITY,
        );
        publisher.publish(event).await.expect("published");
        drop(publisher);

        worker.await.expect("worker finishes");
    }

    #[tokio::test]
    async fn handler_failures_do_not_stop_the_worker() {
        let mut handler = MockDomainEventHandler::new();
        handler
            .expect_handle()
            .times(2)
            .returning(|_| Err(Error::internal("handler exploded")));

        let (publisher, worker) = ChannelDomainEventPublisher::spawn(vec![Arc::new(handler)], 1);
        publisher.publish(duplicate_event()).await.expect("first");
        publisher.publish(duplicate_event()).await.expect("second");
        drop(publisher);

        worker.await.expect("worker finishes");
    }

    #[tokio::test]
    async fn handlers_run_in_the_publisher_trace_scope() {
        let trace_id = TraceId::generate();
        let mut handler = MockDomainEventHandler::new();
        handler
            .expect_handle()
            .withf(move |_| TraceId::current() == Some(trace_id))
            .times(1)
            .returning(|_| Ok(()));

        let (publisher, worker) = ChannelDomainEventPublisher::spawn(vec![Arc::new(handler)], 4);
        TraceId::scope(trace_id, publisher.publish(duplicate_event()))
            .await
            .expect("published");
        drop(publisher);

        worker.await.expect("worker finishes");
    }

    #[tokio::test]
    async fn publishing_after_the_worker_stops_fails() {
        let (publisher, worker) = ChannelDomainEventPublisher::spawn(Vec::new(), 1);
        worker.abort();
        let _ = worker.await;

        let error = publisher
            .publish(duplicate_event())
            .await
            .expect_err("receiver dropped");

        assert!(matches!(error, DomainEventPublisherError::Unavailable { .. }));
    }
}
