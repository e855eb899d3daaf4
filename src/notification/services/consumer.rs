//! Queue consumer driving [`NotificationFanOut`].

use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use super::NotificationFanOut;
use crate::broker::{
    domain::{BrokerError, Delivery},
    ports::EventSource,
    runtime::{InFlight, StopReason},
};
use crate::notification::ports::NotificationRepository;

/// Default number of events processed concurrently, matching the prefetch.
pub const DEFAULT_CONCURRENCY: u16 = 10;

/// How a delivery is settled when storing its notifications fails.
///
/// Malformed events are acknowledged under either policy so they cannot
/// loop forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log and acknowledge; the notifications for that event are lost.
    #[default]
    Acknowledge,
    /// Log and ask the broker to redeliver.
    Requeue,
}

/// Consumes task events and fans them out with bounded concurrency.
///
/// A delivery is settled only after its notifications are written.
pub struct FanOutConsumer<S, R, C>
where
    S: EventSource + ?Sized,
    R: NotificationRepository,
    C: Clock + Send + Sync,
{
    source: Arc<S>,
    fan_out: Arc<NotificationFanOut<R, C>>,
    policy: FailurePolicy,
    concurrency: u16,
}

impl<S, R, C> FanOutConsumer<S, R, C>
where
    S: EventSource + ?Sized,
    R: NotificationRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a consumer with the default policy and concurrency.
    #[must_use]
    pub const fn new(source: Arc<S>, fan_out: Arc<NotificationFanOut<R, C>>) -> Self {
        Self {
            source,
            fan_out,
            policy: FailurePolicy::Acknowledge,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the failure policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many events may be processed at once. Zero is raised to one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: u16) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Consumes events until `shutdown` resolves or the source closes, then
    /// waits for in-flight events to settle.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the source fails.
    pub async fn run(
        &self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<StopReason, BrokerError> {
        let in_flight = InFlight::new(self.concurrency);
        tracing::info!(
            concurrency = self.concurrency,
            policy = ?self.policy,
            "notification fan-out consumer started"
        );
        tokio::pin!(shutdown);
        let outcome = loop {
            let slot = tokio::select! {
                () = &mut shutdown => break Ok(StopReason::Requested),
                slot = in_flight.reserve() => slot?,
            };
            let next = tokio::select! {
                () = &mut shutdown => break Ok(StopReason::Requested),
                next = self.source.next_delivery() => next,
            };
            let delivery = match next {
                Ok(Some(delivery)) => delivery,
                Ok(None) => break Ok(StopReason::SourceClosed),
                Err(err) => break Err(err),
            };
            let fan_out = Arc::clone(&self.fan_out);
            let policy = self.policy;
            slot.spawn(async move {
                settle(&fan_out, policy, delivery).await;
            });
        };

        in_flight.drain().await?;
        tracing::info!(stopped = ?outcome, "notification fan-out consumer stopped");
        outcome
    }
}

async fn settle<R, C>(fan_out: &NotificationFanOut<R, C>, policy: FailurePolicy, delivery: Delivery)
where
    R: NotificationRepository,
    C: Clock + Send + Sync,
{
    let routing_key = delivery.event().routing_key();
    let event_id = delivery.event().event_id();
    let redelivered = delivery.redelivered();
    let settled = match fan_out.handle(delivery.event()).await {
        Ok(_) => delivery.ack().await,
        Err(err) if err.is_transient() && policy == FailurePolicy::Requeue => {
            tracing::warn!(%routing_key, %event_id, redelivered, error = %err, "requeueing event");
            delivery.nack(true).await
        }
        Err(err) => {
            tracing::error!(%routing_key, %event_id, redelivered, error = %err, "dropping event");
            delivery.ack().await
        }
    };
    if let Err(err) = settled {
        tracing::warn!(%routing_key, %event_id, error = %err, "failed to settle delivery");
    }
}
