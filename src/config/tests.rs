//! Configuration layering tests.

use super::{AppConfig, LogFormat};
use crate::notification::services::FailurePolicy;
use rstest::rstest;
use std::time::Duration;

#[rstest]
fn defaults_match_documented_values() {
    let config = AppConfig::from_toml("").expect("empty document should load");

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.broker.exchange, "tasks.events");
    assert_eq!(config.broker.prefetch, 10);
    assert_eq!(config.gateway.request_timeout(), Duration::from_secs(30));
    assert!(!config.notifications.notify_on_comment);
    assert_eq!(config.notifications.failure_policy, FailurePolicy::Acknowledge);
}

#[rstest]
fn file_values_override_defaults_per_key() {
    let config = AppConfig::from_toml(
        r#"
        [broker]
        exchange = "audit.events"
        prefetch = 32

        [notifications]
        notify_on_comment = true
        failure_policy = "requeue"

        [notifications.templates]
        task_assigned = "Assigned: {{ title }}"

        [logging]
        format = "json"
        "#,
    )
    .expect("document should load");

    assert_eq!(config.broker.exchange, "audit.events");
    assert_eq!(config.broker.prefetch, 32);
    assert_eq!(config.broker.connection_name, "tasktrack");
    assert!(config.notifications.fan_out_settings().notify_on_comment);
    assert_eq!(config.notifications.failure_policy, FailurePolicy::Requeue);
    assert_eq!(config.notifications.templates.task_assigned, "Assigned: {{ title }}");
    assert_eq!(
        config.notifications.templates.comment_added,
        "New comment on task: {{ title }}"
    );
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level, "info");
}

#[rstest]
#[case("[broker]\nprefetch = \"many\"")]
#[case("[notifications]\nfailure_policy = \"retry_forever\"")]
fn mistyped_values_are_rejected(#[case] document: &str) {
    assert!(AppConfig::from_toml(document).is_err());
}
