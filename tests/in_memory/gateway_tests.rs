//! Gateway calls against wired and missing services.

use std::sync::Arc;

use super::helpers::{Stack, stack};
use rstest::rstest;
use tasktrack::broker::adapters::memory::InMemoryBroker;
use tasktrack::broker::domain::RemoteErrorKind;
use tasktrack::gateway::{GatewayClient, GatewayError};
use tasktrack::notification::domain::NotificationId;
use tasktrack::task::domain::{TaskStatus, UserId};
use tasktrack::task::services::CreateTaskPayload;

fn create_payload(user_id: UserId, title: &str, assignee_ids: Vec<UserId>) -> CreateTaskPayload {
    CreateTaskPayload {
        user_id,
        title: title.to_owned(),
        description: None,
        due_date: None,
        priority: None,
        assignee_ids,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifications_round_trip_through_the_gateway(stack: Stack) -> Result<(), eyre::Report> {
    let author = UserId::new();
    let assignee = UserId::new();
    let created = stack
        .gateway
        .create_task(&create_payload(author, "Plan the offsite", vec![assignee]))
        .await?;
    stack
        .gateway
        .update_task_status(created.id, TaskStatus::Done, author)
        .await?;
    stack.drain_events().await?;

    let page = stack.gateway.notifications(assignee, None, None).await;
    assert_eq!(page.total, 2);
    assert_eq!(page.limit, 20);
    let first = page
        .items
        .first()
        .ok_or_else(|| eyre::eyre!("expected notifications for the assignee"))?;

    let read = stack.gateway.mark_notification_read(first.id, assignee).await?;
    assert!(read.is_read);
    let fetched = stack
        .gateway
        .notification(first.id, assignee)
        .await
        .ok_or_else(|| eyre::eyre!("notification disappeared"))?;
    assert!(fetched.is_read);

    stack.gateway.mark_all_notifications_read(assignee).await?;
    let after = stack.gateway.notifications(assignee, None, None).await;
    assert!(after.items.iter().all(|item| item.is_read));

    stack.gateway.delete_notification(first.id, assignee).await?;
    assert_eq!(stack.gateway.notifications(assignee, None, None).await.total, 1);
    assert_eq!(stack.gateway.notifications(author, None, None).await.total, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifications_of_other_users_stay_hidden(stack: Stack) -> Result<(), eyre::Report> {
    let assignee = UserId::new();
    stack
        .gateway
        .create_task(&create_payload(UserId::new(), "Audit access", vec![assignee]))
        .await?;
    stack.drain_events().await?;
    let page = stack.gateway.notifications(assignee, None, None).await;
    let item = page
        .items
        .first()
        .ok_or_else(|| eyre::eyre!("expected one notification"))?;

    let stranger = UserId::new();
    assert!(stack.gateway.notification(item.id, stranger).await.is_none());
    let err = stack
        .gateway
        .mark_notification_read(item.id, stranger)
        .await
        .expect_err("another user's notification must not be found");
    assert!(matches!(
        err,
        GatewayError::Rejected {
            kind: RemoteErrorKind::NotFound,
            ..
        }
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_mutations_surface_as_rejections(stack: Stack) {
    let err = stack
        .gateway
        .create_task(&create_payload(UserId::new(), "ab", Vec::new()))
        .await
        .expect_err("a two-character title must be rejected");

    assert!(matches!(
        err,
        GatewayError::Rejected {
            kind: RemoteErrorKind::Validation,
            ..
        }
    ));
    assert!(stack.broker.published().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_notifications_service_degrades_reads_and_fails_writes() {
    let gateway = GatewayClient::new(Arc::new(InMemoryBroker::new()));
    let user = UserId::new();

    let page = gateway.notifications(user, Some(500), Some(40)).await;
    assert!(page.items.is_empty());
    assert_eq!((page.total, page.limit, page.offset), (0, 100, 40));
    assert!(gateway.notification(NotificationId::new(), user).await.is_none());
    assert!(gateway.all_tasks().await.is_empty());

    let err = gateway
        .mark_all_notifications_read(user)
        .await
        .expect_err("writes must fail when the service is unreachable");
    assert!(err.is_unavailable());
}
