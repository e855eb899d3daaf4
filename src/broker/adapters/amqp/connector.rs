//! Lazily established, explicitly owned broker connection.

use lapin::options::{ConfirmSelectOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::sync::Mutex;

use crate::broker::domain::BrokerError;
use crate::config::BrokerConfig;

/// Owns the AMQP connection and the publishing channel.
///
/// Nothing is opened until the first call that needs the broker. When the
/// cached connection is found closed, the next call re-opens it; there is no
/// background reconnect loop. Call [`AmqpConnector::close`] on shutdown.
pub struct AmqpConnector {
    url: String,
    connection_name: String,
    exchange: String,
    session: Mutex<Option<Session>>,
}

struct Session {
    connection: Connection,
    channel: Channel,
}

impl Session {
    fn is_open(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }
}

impl AmqpConnector {
    /// Creates an unopened connector.
    #[must_use]
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            url: config.url.clone(),
            connection_name: config.connection_name.clone(),
            exchange: config.exchange.clone(),
            session: Mutex::new(None),
        }
    }

    /// Returns the topic exchange events are published to.
    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Returns the shared publishing channel, opening the connection if
    /// needed. The channel has publisher confirms enabled.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Connection`] when the broker is unreachable.
    pub async fn channel(&self) -> Result<Channel, BrokerError> {
        let mut slot = self.session.lock().await;
        let session = self.ensure_open(&mut slot).await?;
        Ok(session.channel.clone())
    }

    /// Opens an additional channel on the shared connection.
    ///
    /// Consumers get their own channel so that prefetch limits do not apply
    /// to publishing.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Connection`] when the broker is unreachable.
    pub async fn create_channel(&self) -> Result<Channel, BrokerError> {
        let mut slot = self.session.lock().await;
        let session = self.ensure_open(&mut slot).await?;
        session
            .connection
            .create_channel()
            .await
            .map_err(BrokerError::connection)
    }

    /// Closes the channel and connection if they are open.
    pub async fn close(&self) {
        let Some(session) = self.session.lock().await.take() else {
            return;
        };
        if let Err(err) = session.channel.close(200, "shutdown").await {
            tracing::warn!(error = %err, "error closing broker channel");
        }
        if let Err(err) = session.connection.close(200, "shutdown").await {
            tracing::warn!(error = %err, "error closing broker connection");
        }
        tracing::info!(exchange = %self.exchange, "broker connection closed");
    }

    async fn ensure_open<'a>(
        &self,
        slot: &'a mut Option<Session>,
    ) -> Result<&'a Session, BrokerError> {
        if slot.as_ref().is_some_and(|session| !session.is_open()) {
            tracing::warn!(exchange = %self.exchange, "broker connection dropped, reconnecting");
            *slot = None;
        }
        if slot.is_none() {
            *slot = Some(self.open().await?);
        }
        slot.as_ref().ok_or(BrokerError::Closed)
    }

    async fn open(&self) -> Result<Session, BrokerError> {
        let properties =
            ConnectionProperties::default().with_connection_name(self.connection_name.clone().into());
        let connection = Connection::connect(&self.url, properties)
            .await
            .map_err(BrokerError::connection)?;
        let channel = connection
            .create_channel()
            .await
            .map_err(BrokerError::connection)?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(BrokerError::connection)?;
        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::connection)?;
        tracing::info!(exchange = %self.exchange, "connected to broker exchange");
        Ok(Session {
            connection,
            channel,
        })
    }
}
