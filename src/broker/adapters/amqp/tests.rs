//! AMQP request framing and client routing; none of these need a broker.

use std::sync::Arc;
use std::time::Duration;

use lapin::BasicProperties;
use lapin::types::ShortString;
use rstest::{fixture, rstest};
use serde_json::json;

use super::rpc::{request_pattern, request_properties};
use super::{AmqpConnector, AmqpMessageClient, DIRECT_REPLY_TO};
use crate::broker::{
    domain::{BrokerError, RemoteErrorKind, RequestPattern},
    ports::MessageClient,
};
use crate::config::BrokerConfig;

fn text(value: Option<&ShortString>) -> Option<&str> {
    value.map(ShortString::as_str)
}

#[fixture]
fn connector() -> Arc<AmqpConnector> {
    Arc::new(AmqpConnector::new(&BrokerConfig::default()))
}

#[rstest]
#[case(RequestPattern::TaskCreate)]
#[case(RequestPattern::CommentGetByTask)]
#[case(RequestPattern::NotificationMarkAllAsRead)]
fn pattern_travels_in_the_type_property(#[case] pattern: RequestPattern) {
    let properties = request_properties("corr-1", pattern);

    assert_eq!(text(properties.kind().as_ref()), Some(pattern.as_str()));
    assert_eq!(text(properties.reply_to().as_ref()), Some(DIRECT_REPLY_TO));
    assert_eq!(text(properties.correlation_id().as_ref()), Some("corr-1"));
    assert_eq!(request_pattern(&properties), Ok(pattern));
}

#[rstest]
#[case(BasicProperties::default())]
#[case(BasicProperties::default().with_type("tasks.task.archive".into()))]
fn missing_or_unknown_type_is_rejected(#[case] properties: BasicProperties) {
    let rejection = request_pattern(&properties).expect_err("pattern should not resolve");

    assert_eq!(rejection.kind, RemoteErrorKind::UnknownPattern);
}

#[rstest]
fn service_client_routes_each_prefix_to_its_queue(connector: Arc<AmqpConnector>) {
    let config = BrokerConfig::default();
    let client = AmqpMessageClient::for_services(connector, &config, Duration::from_secs(1));

    assert_eq!(client.route(RequestPattern::TaskList), Some("tasks_queue"));
    assert_eq!(
        client.route(RequestPattern::NotificationDelete),
        Some("notifications_queue")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unrouted_pattern_fails_without_touching_the_broker(connector: Arc<AmqpConnector>) {
    let client = AmqpMessageClient::new(connector, Duration::from_secs(1))
        .with_route("tasks", "tasks_queue");

    let outcome = client
        .send(RequestPattern::NotificationGetByUser, json!({"userId": "u-1"}))
        .await;

    assert!(matches!(outcome, Err(BrokerError::Closed)));
}
