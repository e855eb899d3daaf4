//! Notifications service.
//!
//! Consumes task events into per-user notifications and serves the
//! `notifications.*` request patterns. Both loops share one broker
//! connection and stop together on Ctrl-C, letting in-flight events settle.

use std::sync::Arc;

use eyre::{Result, WrapErr};
use futures::FutureExt;
use mockable::DefaultClock;
use tasktrack::broker::adapters::amqp::{AmqpConnector, AmqpEventSource, AmqpRpcServer};
use tasktrack::broker::domain::RoutingKey;
use tasktrack::broker::ports::RequestHandler;
use tasktrack::config::AppConfig;
use tasktrack::notification::adapters::postgres::PostgresNotificationRepository;
use tasktrack::notification::services::{
    FanOutConsumer, NotificationFanOut, NotificationRequestHandler, NotificationService,
};
use tasktrack::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().wrap_err("failed to load configuration")?;
    telemetry::init(&config.logging).wrap_err("failed to initialise logging")?;

    let database = config.database.clone();
    let pool = tokio::task::spawn_blocking(move || database.connect())
        .await
        .wrap_err("database connect task failed")?
        .wrap_err("failed to connect to PostgreSQL")?;
    let repository = Arc::new(PostgresNotificationRepository::new(pool));

    let connector = Arc::new(AmqpConnector::new(&config.broker));
    let source = AmqpEventSource::bind(
        &connector,
        &config.broker.events_queue,
        &RoutingKey::ALL,
        config.broker.prefetch,
    )
    .await
    .wrap_err("failed to bind the event queue")?;
    let fan_out = NotificationFanOut::new(Arc::clone(&repository), Arc::new(DefaultClock))
        .with_templates(config.notifications.templates.clone())
        .with_settings(config.notifications.fan_out_settings());
    let consumer = FanOutConsumer::new(Arc::new(source), Arc::new(fan_out))
        .with_policy(config.notifications.failure_policy)
        .with_concurrency(config.broker.prefetch);

    let service = Arc::new(NotificationService::new(repository));
    let handler: Arc<dyn RequestHandler> = Arc::new(NotificationRequestHandler::new(service));
    let server = AmqpRpcServer::new(
        Arc::clone(&connector),
        config.broker.notifications_queue.as_str(),
        handler,
        config.broker.prefetch,
    );

    tracing::info!(
        events_queue = %config.broker.events_queue,
        requests_queue = %config.broker.notifications_queue,
        "notifications service starting"
    );
    let shutdown = shutdown_signal().boxed().shared();
    // A stream ending before shutdown means the broker dropped us; exit non-zero.
    let server_shutdown = shutdown.clone();
    let outcome = tokio::try_join!(
        async { server.run(server_shutdown).await?.expect_requested() },
        async { consumer.run(shutdown).await?.expect_requested() },
    );
    connector.close().await;
    outcome.wrap_err("notifications service failed")?;
    tracing::info!("notifications service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
