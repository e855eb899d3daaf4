//! In-process broker used by tests and single-binary deployments.
//!
//! Events are routed to subscribers by routing key through unbounded
//! channels; request patterns are dispatched straight to registered
//! [`RequestHandler`]s. Every publication and settlement is recorded so
//! tests can assert on broker traffic.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use uuid::Uuid;

use crate::broker::{
    domain::{Acknowledger, BrokerError, Delivery, DomainEvent, RequestPattern, RoutingKey},
    ports::{EventPublisher, EventSource, MessageClient, RequestHandler},
};

type Envelope = (DomainEvent, bool);

/// Settlement recorded for a delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The consumer acknowledged the event.
    Acked(Uuid),
    /// The consumer rejected the event.
    Nacked {
        /// Rejected event.
        event_id: Uuid,
        /// Whether redelivery was requested.
        requeue: bool,
    },
}

/// Thread-safe in-memory broker.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

#[derive(Default)]
struct BrokerState {
    published: Vec<DomainEvent>,
    subscriptions: Vec<Subscription>,
    handlers: Vec<(String, Arc<dyn RequestHandler>)>,
    settlements: Vec<Settlement>,
}

struct Subscription {
    keys: Vec<RoutingKey>,
    sender: UnboundedSender<Envelope>,
}

impl InMemoryBroker {
    /// Creates an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers the handler serving every pattern of `service`.
    pub fn register_handler(&self, service: impl Into<String>, handler: Arc<dyn RequestHandler>) {
        self.lock().handlers.push((service.into(), handler));
    }

    /// Subscribes a new queue bound to the given routing keys.
    #[must_use]
    pub fn subscribe(&self, keys: &[RoutingKey]) -> InMemoryEventSource {
        let (sender, receiver) = mpsc::unbounded_channel();
        let requeue = sender.downgrade();
        self.lock().subscriptions.push(Subscription {
            keys: keys.to_vec(),
            sender,
        });
        InMemoryEventSource {
            receiver: tokio::sync::Mutex::new(receiver),
            requeue,
            broker: self.clone(),
        }
    }

    /// Delivers an event to subscribers as a broker redelivery would.
    pub fn redeliver(&self, event: &DomainEvent) {
        self.route(event, true);
    }

    /// Drops every subscription so sources drain and then report closed.
    pub fn close(&self) {
        self.lock().subscriptions.clear();
    }

    /// Returns every event published so far, oldest first.
    #[must_use]
    pub fn published(&self) -> Vec<DomainEvent> {
        self.lock().published.clone()
    }

    /// Returns published events with the given routing key.
    #[must_use]
    pub fn published_with(&self, key: RoutingKey) -> Vec<DomainEvent> {
        self.lock()
            .published
            .iter()
            .filter(|event| event.routing_key() == key)
            .cloned()
            .collect()
    }

    /// Returns every settlement recorded so far.
    #[must_use]
    pub fn settlements(&self) -> Vec<Settlement> {
        self.lock().settlements.clone()
    }

    fn route(&self, event: &DomainEvent, redelivered: bool) {
        let mut state = self.lock();
        state.subscriptions.retain(|subscription| {
            if !subscription.keys.contains(&event.routing_key()) {
                return true;
            }
            subscription
                .sender
                .send((event.clone(), redelivered))
                .is_ok()
        });
    }

    fn settle(&self, settlement: Settlement) {
        self.lock().settlements.push(settlement);
    }
}

#[async_trait]
impl EventPublisher for InMemoryBroker {
    async fn publish(&self, event: &DomainEvent) {
        self.lock().published.push(event.clone());
        self.route(event, false);
        tracing::debug!(
            routing_key = %event.routing_key(),
            event_id = %event.event_id(),
            "published event in memory"
        );
    }
}

#[async_trait]
impl MessageClient for InMemoryBroker {
    async fn send(&self, pattern: RequestPattern, payload: Value) -> Result<Value, BrokerError> {
        let handler = self
            .lock()
            .handlers
            .iter()
            .find(|(service, _)| service == pattern.service())
            .map(|(_, handler)| Arc::clone(handler))
            .ok_or(BrokerError::Closed)?;
        Ok(handler.handle(pattern, payload).await?)
    }
}

/// Queue subscription created by [`InMemoryBroker::subscribe`].
pub struct InMemoryEventSource {
    receiver: tokio::sync::Mutex<UnboundedReceiver<Envelope>>,
    requeue: WeakUnboundedSender<Envelope>,
    broker: InMemoryBroker,
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn next_delivery(&self) -> Result<Option<Delivery>, BrokerError> {
        let next = self.receiver.lock().await.recv().await;
        Ok(next.map(|(event, redelivered)| {
            let acker = InMemoryAcker {
                event: event.clone(),
                requeue: self.requeue.clone(),
                broker: self.broker.clone(),
            };
            Delivery::new(event, redelivered, Box::new(acker))
        }))
    }
}

struct InMemoryAcker {
    event: DomainEvent,
    requeue: WeakUnboundedSender<Envelope>,
    broker: InMemoryBroker,
}

#[async_trait]
impl Acknowledger for InMemoryAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.broker.settle(Settlement::Acked(self.event.event_id()));
        Ok(())
    }

    async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        self.broker.settle(Settlement::Nacked {
            event_id: self.event.event_id(),
            requeue,
        });
        if requeue {
            let sender = self.requeue.upgrade().ok_or(BrokerError::Closed)?;
            sender
                .send((self.event.clone(), true))
                .map_err(|_| BrokerError::Closed)?;
        }
        Ok(())
    }
}
