//! Shared wiring for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasktrack::broker::adapters::memory::{InMemoryBroker, InMemoryEventSource};
use tasktrack::broker::domain::RoutingKey;
use tasktrack::broker::ports::RequestHandler;
use tasktrack::gateway::GatewayClient;
use tasktrack::notification::adapters::memory::InMemoryNotificationRepository;
use tasktrack::notification::services::{
    FanOutConsumer, FanOutSettings, NotificationFanOut, NotificationRequestHandler,
    NotificationService,
};
use tasktrack::task::adapters::memory::InMemoryTaskRepository;
use tasktrack::task::services::{TaskMutator, TaskRequestHandler};

/// Mutator wired to the in-memory broker.
pub type Mutator = TaskMutator<InMemoryTaskRepository, InMemoryBroker, DefaultClock>;

/// Consumer reading the in-memory event queue.
pub type Consumer =
    FanOutConsumer<InMemoryEventSource, InMemoryNotificationRepository, DefaultClock>;

/// Both services wired through one in-memory broker.
pub struct Stack {
    pub broker: InMemoryBroker,
    pub tasks: Arc<Mutator>,
    pub notifications: Arc<InMemoryNotificationRepository>,
    pub consumer: Consumer,
    pub gateway: GatewayClient<InMemoryBroker>,
}

impl Stack {
    /// Wires both services with the given fan-out settings.
    #[must_use]
    pub fn new(settings: FanOutSettings) -> Self {
        let broker = InMemoryBroker::new();
        let source = broker.subscribe(&RoutingKey::ALL);

        let tasks = Arc::new(TaskMutator::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(broker.clone()),
            Arc::new(DefaultClock),
        ));
        let task_handler: Arc<dyn RequestHandler> =
            Arc::new(TaskRequestHandler::new(Arc::clone(&tasks)));
        broker.register_handler("tasks", task_handler);

        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let notification_handler: Arc<dyn RequestHandler> = Arc::new(
            NotificationRequestHandler::new(Arc::new(NotificationService::new(Arc::clone(
                &notifications,
            )))),
        );
        broker.register_handler("notifications", notification_handler);

        let fan_out = NotificationFanOut::new(Arc::clone(&notifications), Arc::new(DefaultClock))
            .with_settings(settings);
        let consumer = FanOutConsumer::new(Arc::new(source), Arc::new(fan_out));
        let gateway = GatewayClient::new(Arc::new(broker.clone()));

        Self {
            broker,
            tasks,
            notifications,
            consumer,
            gateway,
        }
    }

    /// Closes the event queue and runs the consumer until it has settled
    /// every buffered event.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer fails.
    pub async fn drain_events(&self) -> Result<(), eyre::Report> {
        self.broker.close();
        self.consumer.run(std::future::pending()).await?;
        Ok(())
    }
}

/// Provides a stack with default fan-out settings.
#[fixture]
pub fn stack() -> Stack {
    Stack::new(FanOutSettings::default())
}
