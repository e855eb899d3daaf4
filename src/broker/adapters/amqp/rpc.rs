//! Request/response over the default exchange with direct reply-to.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{AmqpConnector, AmqpEventPublisher, DIRECT_REPLY_TO, JSON_CONTENT_TYPE};
use crate::config::BrokerConfig;
use crate::broker::{
    domain::{BrokerError, DomainEvent, RemoteError, RemoteErrorKind, RequestPattern, RpcReply},
    ports::{EventPublisher, MessageClient, RequestHandler},
    runtime::{InFlight, StopReason},
};

type PendingReplies = Arc<Mutex<HashMap<String, oneshot::Sender<RpcReply>>>>;

struct ReplyChannel {
    channel: Channel,
    listener: JoinHandle<()>,
}

/// Sends requests to service queues and publishes events.
///
/// This is the caller half of the request servers: the tasks and
/// notifications binaries only serve, so in-crate use goes through
/// [`GatewayClient::over_amqp`](crate::gateway::GatewayClient::over_amqp).
/// Each service prefix (`tasks`, `notifications`) maps to the queue its
/// server consumes. Replies arrive on the direct reply-to pseudo-queue and
/// are matched to callers by correlation id.
pub struct AmqpMessageClient {
    connector: Arc<AmqpConnector>,
    publisher: AmqpEventPublisher,
    routes: HashMap<String, String>,
    timeout: Duration,
    pending: PendingReplies,
    replies: tokio::sync::Mutex<Option<ReplyChannel>>,
}

impl AmqpMessageClient {
    /// Creates a client that waits at most `timeout` for each reply.
    #[must_use]
    pub fn new(connector: Arc<AmqpConnector>, timeout: Duration) -> Self {
        Self {
            publisher: AmqpEventPublisher::new(Arc::clone(&connector)),
            connector,
            routes: HashMap::new(),
            timeout,
            pending: Arc::default(),
            replies: tokio::sync::Mutex::new(None),
        }
    }

    /// Creates a client routed to the tasks and notifications queues named
    /// in `config`.
    #[must_use]
    pub fn for_services(
        connector: Arc<AmqpConnector>,
        config: &BrokerConfig,
        timeout: Duration,
    ) -> Self {
        Self::new(connector, timeout)
            .with_route(RequestPattern::TaskCreate.service(), &config.tasks_queue)
            .with_route(
                RequestPattern::NotificationGetByUser.service(),
                &config.notifications_queue,
            )
    }

    /// Routes requests whose pattern starts with `service` to `queue`.
    #[must_use]
    pub fn with_route(mut self, service: impl Into<String>, queue: impl Into<String>) -> Self {
        self.routes.insert(service.into(), queue.into());
        self
    }

    /// Returns the queue requests for `pattern` are sent to.
    #[must_use]
    pub fn route(&self, pattern: RequestPattern) -> Option<&str> {
        self.routes.get(pattern.service()).map(String::as_str)
    }

    fn forget(&self, correlation_id: &str) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(correlation_id);
    }

    async fn reply_channel(&self) -> Result<Channel, BrokerError> {
        let mut slot = self.replies.lock().await;
        if let Some(current) = slot.as_ref() {
            if current.channel.status().connected() && !current.listener.is_finished() {
                return Ok(current.channel.clone());
            }
            current.listener.abort();
        }

        let channel = self.connector.create_channel().await?;
        let mut consumer = channel
            .basic_consume(
                DIRECT_REPLY_TO,
                &format!("reply-{}", Uuid::new_v4()),
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::connection)?;

        let pending = Arc::clone(&self.pending);
        let listener = tokio::spawn(async move {
            while let Some(Ok(delivery)) = consumer.next().await {
                let Some(correlation_id) = delivery.properties.correlation_id().as_ref() else {
                    tracing::debug!("reply without correlation id ignored");
                    continue;
                };
                let reply = serde_json::from_slice::<RpcReply>(&delivery.data).unwrap_or_else(
                    |err| {
                        RpcReply::Error(RemoteError::new(
                            RemoteErrorKind::Storage,
                            format!("undecodable reply: {err}"),
                        ))
                    },
                );
                let waiter = pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(correlation_id.as_str());
                let Some(sender) = waiter else {
                    tracing::debug!(
                        correlation_id = correlation_id.as_str(),
                        "late reply discarded"
                    );
                    continue;
                };
                if sender.send(reply).is_err() {
                    tracing::debug!(
                        correlation_id = correlation_id.as_str(),
                        "caller gave up before reply arrived"
                    );
                }
            }
            tracing::warn!("reply consumer stopped");
        });

        *slot = Some(ReplyChannel {
            channel: channel.clone(),
            listener,
        });
        Ok(channel)
    }
}

#[async_trait]
impl EventPublisher for AmqpMessageClient {
    async fn publish(&self, event: &DomainEvent) {
        self.publisher.publish(event).await;
    }
}

#[async_trait]
impl MessageClient for AmqpMessageClient {
    async fn send(&self, pattern: RequestPattern, payload: Value) -> Result<Value, BrokerError> {
        let queue = self.route(pattern).ok_or(BrokerError::Closed)?;
        let body = serde_json::to_vec(&payload)?;
        let channel = self.reply_channel().await?;

        let correlation_id = Uuid::new_v4().to_string();
        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(correlation_id.clone(), sender);

        let properties = request_properties(&correlation_id, pattern);
        if let Err(err) = channel
            .basic_publish("", queue, BasicPublishOptions::default(), &body, properties)
            .await
        {
            self.forget(&correlation_id);
            return Err(BrokerError::operation(err));
        }

        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(reply)) => Ok(reply.into_result()?),
            Ok(Err(_)) => Err(BrokerError::Closed),
            Err(_) => {
                self.forget(&correlation_id);
                Err(BrokerError::Timeout {
                    pattern: pattern.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

/// Serves requests from one service queue.
pub struct AmqpRpcServer {
    connector: Arc<AmqpConnector>,
    queue: String,
    handler: Arc<dyn RequestHandler>,
    prefetch: u16,
}

impl AmqpRpcServer {
    /// Creates a server for `queue` that handles up to `prefetch` requests
    /// concurrently.
    #[must_use]
    pub fn new(
        connector: Arc<AmqpConnector>,
        queue: impl Into<String>,
        handler: Arc<dyn RequestHandler>,
        prefetch: u16,
    ) -> Self {
        Self {
            connector,
            queue: queue.into(),
            handler,
            prefetch: prefetch.max(1),
        }
    }

    /// Consumes requests until `shutdown` resolves or the queue closes, then
    /// waits for in-flight requests to be answered.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the queue cannot be declared or the
    /// consumer fails.
    pub async fn run(
        &self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<StopReason, BrokerError> {
        let channel = self.connector.create_channel().await?;
        channel
            .basic_qos(self.prefetch, BasicQosOptions::default())
            .await
            .map_err(BrokerError::connection)?;
        channel
            .queue_declare(
                &self.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::connection)?;
        let mut consumer = channel
            .basic_consume(
                &self.queue,
                &format!("{}-{}", self.queue, Uuid::new_v4()),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::connection)?;
        tracing::info!(queue = %self.queue, "serving requests");

        let in_flight = InFlight::new(self.prefetch);
        tokio::pin!(shutdown);
        let outcome = loop {
            let next = tokio::select! {
                () = &mut shutdown => break Ok(StopReason::Requested),
                next = consumer.next() => next,
            };
            let delivery = match next {
                Some(Ok(delivery)) => delivery,
                Some(Err(err)) => break Err(BrokerError::operation(err)),
                None => break Ok(StopReason::SourceClosed),
            };
            let slot = in_flight.reserve().await?;
            let handler = Arc::clone(&self.handler);
            let reply_channel = channel.clone();
            slot.spawn(async move {
                serve_request(handler.as_ref(), &reply_channel, delivery).await;
            });
        };

        // Callers close the connection once this returns; every reply goes out first.
        in_flight.drain().await?;
        tracing::info!(queue = %self.queue, stopped = ?outcome, "request server stopped");
        outcome
    }
}

async fn serve_request(
    handler: &dyn RequestHandler,
    channel: &Channel,
    delivery: lapin::message::Delivery,
) {
    let reply = match decode_request(&delivery) {
        Ok((pattern, payload)) => {
            tracing::debug!(%pattern, "handling request");
            RpcReply::from(handler.handle(pattern, payload).await)
        }
        Err(err) => RpcReply::Error(err),
    };

    if let Some(reply_to) = delivery.properties.reply_to().as_ref() {
        if let Err(err) = send_reply(channel, reply_to.as_str(), &delivery, &reply).await {
            tracing::warn!(error = %err, "failed to send reply");
        }
    }
    if let Err(err) = delivery.acker.ack(BasicAckOptions::default()).await {
        tracing::warn!(error = %err, "failed to acknowledge request");
    }
}

/// Properties of an outgoing request; the AMQP `type` carries the pattern.
pub(super) fn request_properties(
    correlation_id: &str,
    pattern: RequestPattern,
) -> BasicProperties {
    BasicProperties::default()
        .with_correlation_id(correlation_id.into())
        .with_reply_to(DIRECT_REPLY_TO.into())
        .with_type(pattern.as_str().into())
        .with_content_type(JSON_CONTENT_TYPE.into())
}

/// Reads the request pattern back from the AMQP `type` property.
pub(super) fn request_pattern(
    properties: &BasicProperties,
) -> Result<RequestPattern, RemoteError> {
    let name = properties
        .kind()
        .as_ref()
        .map(|kind| kind.as_str().to_owned())
        .unwrap_or_default();
    RequestPattern::try_from(name.as_str())
        .map_err(|err| RemoteError::new(RemoteErrorKind::UnknownPattern, err.to_string()))
}

fn decode_request(
    delivery: &lapin::message::Delivery,
) -> Result<(RequestPattern, Value), RemoteError> {
    let pattern = request_pattern(&delivery.properties)?;
    let payload = serde_json::from_slice(&delivery.data)
        .map_err(|err| RemoteError::validation(format!("malformed request body: {err}")))?;
    Ok((pattern, payload))
}

async fn send_reply(
    channel: &Channel,
    reply_to: &str,
    delivery: &lapin::message::Delivery,
    reply: &RpcReply,
) -> Result<(), BrokerError> {
    let body = serde_json::to_vec(reply)?;
    let mut properties = BasicProperties::default().with_content_type(JSON_CONTENT_TYPE.into());
    if let Some(correlation_id) = delivery.properties.correlation_id().clone() {
        properties = properties.with_correlation_id(correlation_id);
    }
    channel
        .basic_publish("", reply_to, BasicPublishOptions::default(), &body, properties)
        .await
        .map_err(BrokerError::operation)?;
    Ok(())
}
