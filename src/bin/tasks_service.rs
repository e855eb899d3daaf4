//! Tasks service.
//!
//! Serves the `tasks.*` request patterns from the tasks queue and publishes
//! task events on the topic exchange. Configuration is read as described in
//! [`tasktrack::config`]; schema migrations live under `migrations/` and are
//! applied with the Diesel CLI before start-up.

use std::sync::Arc;

use eyre::{Result, WrapErr};
use mockable::DefaultClock;
use tasktrack::broker::adapters::amqp::{AmqpConnector, AmqpEventPublisher, AmqpRpcServer};
use tasktrack::broker::ports::RequestHandler;
use tasktrack::broker::runtime::StopReason;
use tasktrack::config::AppConfig;
use tasktrack::task::adapters::postgres::PostgresTaskRepository;
use tasktrack::task::services::{TaskMutator, TaskRequestHandler};
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
    let repository = Arc::new(PostgresTaskRepository::new(pool));

    let connector = Arc::new(AmqpConnector::new(&config.broker));
    let publisher = Arc::new(AmqpEventPublisher::new(Arc::clone(&connector)));
    let mutator = Arc::new(TaskMutator::new(
        repository,
        publisher,
        Arc::new(DefaultClock),
    ));
    let handler: Arc<dyn RequestHandler> = Arc::new(TaskRequestHandler::new(mutator));
    let server = AmqpRpcServer::new(
        Arc::clone(&connector),
        config.broker.tasks_queue.as_str(),
        handler,
        config.broker.prefetch,
    );

    tracing::info!(queue = %config.broker.tasks_queue, "tasks service starting");
    let outcome = server
        .run(shutdown_signal())
        .await
        .and_then(StopReason::expect_requested);
    connector.close().await;
    outcome.wrap_err("tasks request server failed")?;
    tracing::info!("tasks service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
