//! Consumer settlement and failure policy tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::broker::{
    adapters::memory::{InMemoryBroker, InMemoryEventSource, Settlement},
    domain::{DomainEvent, RoutingKey},
    ports::EventPublisher,
    runtime::StopReason,
};
use crate::notification::{
    adapters::memory::InMemoryNotificationRepository,
    domain::{NotificationId, NotificationRecord},
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
    services::{FailurePolicy, FanOutConsumer, NotificationFanOut},
};
use crate::task::domain::{TaskId, UserId};
use crate::test_support::SteppingClock;
use rstest::rstest;
use serde_json::json;

/// Repository whose first `failures` inserts fail.
struct FlakyRepository {
    inner: InMemoryNotificationRepository,
    failures: AtomicUsize,
}

impl FlakyRepository {
    fn failing(failures: usize) -> Self {
        Self {
            inner: InMemoryNotificationRepository::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl NotificationRepository for FlakyRepository {
    async fn insert(&self, records: &[NotificationRecord]) -> NotificationRepositoryResult<usize> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(NotificationRepositoryError::persistence(
                std::io::Error::other("database offline"),
            ));
        }
        self.inner.insert(records).await
    }

    async fn list_for_user(
        &self,
        user: UserId,
        limit: u32,
        offset: u32,
    ) -> NotificationRepositoryResult<(Vec<NotificationRecord>, u64)> {
        self.inner.list_for_user(user, limit, offset).await
    }

    async fn find(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>> {
        self.inner.find(id, user).await
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>> {
        self.inner.mark_read(id, user).await
    }

    async fn mark_all_read(&self, user: UserId) -> NotificationRepositoryResult<u64> {
        self.inner.mark_all_read(user).await
    }

    async fn delete(&self, id: NotificationId, user: UserId) -> NotificationRepositoryResult<bool> {
        self.inner.delete(id, user).await
    }
}

fn assignment(clock: &SteppingClock, assignees: &[UserId]) -> DomainEvent {
    DomainEvent::new(
        RoutingKey::TaskCreated,
        json!({"id": TaskId::new(), "title": "Ship release", "assigneeIds": assignees}),
        clock,
    )
}

fn consumer_over<R>(
    broker: &InMemoryBroker,
    repository: Arc<R>,
    policy: FailurePolicy,
) -> FanOutConsumer<InMemoryEventSource, R, SteppingClock>
where
    R: NotificationRepository + 'static,
{
    let source = Arc::new(broker.subscribe(&RoutingKey::ALL));
    let fan_out = Arc::new(NotificationFanOut::new(
        repository,
        Arc::new(SteppingClock::default()),
    ));
    FanOutConsumer::new(source, fan_out)
        .with_policy(policy)
        .with_concurrency(4)
}

async fn wait_for(broker: &InMemoryBroker, settled: impl Fn(&[Settlement]) -> bool) {
    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        while !settled(&broker.settlements()) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "deliveries were not settled in time");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn processes_and_acknowledges_buffered_events() {
    let broker = InMemoryBroker::new();
    let repository = Arc::new(InMemoryNotificationRepository::new());
    let consumer = consumer_over(&broker, Arc::clone(&repository), FailurePolicy::default());
    let clock = SteppingClock::default();
    let events = [
        assignment(&clock, &[UserId::new(), UserId::new()]),
        assignment(&clock, &[UserId::new()]),
    ];
    for event in &events {
        broker.publish(event).await;
    }
    broker.close();

    let stopped = consumer
        .run(std::future::pending())
        .await
        .expect("consumer should stop cleanly");

    assert_eq!(stopped, StopReason::SourceClosed);
    assert_eq!(repository.snapshot().len(), 3);
    let settlements = broker.settlements();
    assert_eq!(settlements.len(), 2);
    assert!(
        events
            .iter()
            .all(|event| settlements.contains(&Settlement::Acked(event.event_id())))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn redelivery_does_not_duplicate_notifications() {
    let broker = InMemoryBroker::new();
    let repository = Arc::new(InMemoryNotificationRepository::new());
    let consumer = consumer_over(&broker, Arc::clone(&repository), FailurePolicy::default());
    let event = assignment(&SteppingClock::default(), &[UserId::new(), UserId::new()]);
    broker.publish(&event).await;
    broker.redeliver(&event);
    broker.close();

    consumer
        .run(std::future::pending())
        .await
        .expect("consumer should stop cleanly");

    assert_eq!(repository.snapshot().len(), 2);
    assert_eq!(broker.settlements().len(), 2);
}

#[rstest]
#[case(FailurePolicy::Acknowledge)]
#[case(FailurePolicy::Requeue)]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_events_are_acknowledged(#[case] policy: FailurePolicy) {
    let broker = InMemoryBroker::new();
    let repository = Arc::new(InMemoryNotificationRepository::new());
    let consumer = consumer_over(&broker, Arc::clone(&repository), policy);
    let event = DomainEvent::new(
        RoutingKey::TaskUpdated,
        json!("not an object"),
        &SteppingClock::default(),
    );
    broker.publish(&event).await;
    broker.close();

    consumer
        .run(std::future::pending())
        .await
        .expect("consumer should stop cleanly");

    assert_eq!(broker.settlements(), vec![Settlement::Acked(event.event_id())]);
    assert!(repository.snapshot().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fail_open_policy_acknowledges_storage_failures() {
    let broker = InMemoryBroker::new();
    let repository = Arc::new(FlakyRepository::failing(1));
    let consumer = consumer_over(&broker, Arc::clone(&repository), FailurePolicy::Acknowledge);
    let event = assignment(&SteppingClock::default(), &[UserId::new()]);
    broker.publish(&event).await;
    broker.close();

    consumer
        .run(std::future::pending())
        .await
        .expect("consumer should stop cleanly");

    assert_eq!(broker.settlements(), vec![Settlement::Acked(event.event_id())]);
    assert!(repository.inner.snapshot().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fail_closed_policy_requeues_until_stored() {
    let broker = InMemoryBroker::new();
    let repository = Arc::new(FlakyRepository::failing(1));
    let consumer = consumer_over(&broker, Arc::clone(&repository), FailurePolicy::Requeue);
    let event = assignment(&SteppingClock::default(), &[UserId::new()]);
    let event_id = event.event_id();
    broker.publish(&event).await;
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

    let running = tokio::spawn(async move {
        consumer
            .run(async {
                stopped.await.unwrap_or_default();
            })
            .await
    });
    wait_for(&broker, |settlements| {
        settlements.contains(&Settlement::Acked(event_id))
    })
    .await;
    stop.send(()).expect("consumer should still be running");
    let stopped = running
        .await
        .expect("consumer task should join")
        .expect("consumer should stop cleanly");

    assert_eq!(
        broker.settlements(),
        vec![
            Settlement::Nacked {
                event_id,
                requeue: true
            },
            Settlement::Acked(event_id),
        ]
    );
    assert_eq!(repository.inner.snapshot().len(), 1);
    assert_eq!(stopped, StopReason::Requested);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_an_idle_consumer() {
    let broker = InMemoryBroker::new();
    let consumer = consumer_over(
        &broker,
        Arc::new(InMemoryNotificationRepository::new()),
        FailurePolicy::default(),
    );

    let stopped = tokio::time::timeout(Duration::from_secs(5), consumer.run(async {})).await;

    assert!(matches!(stopped, Ok(Ok(StopReason::Requested))));
}
