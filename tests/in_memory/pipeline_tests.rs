//! Task mutations travelling through the broker into notifications.

use super::helpers::{Stack, stack};
use rstest::rstest;
use tasktrack::broker::adapters::memory::Settlement;
use tasktrack::broker::domain::RoutingKey;
use tasktrack::notification::domain::NotificationType;
use tasktrack::notification::services::FanOutSettings;
use tasktrack::task::domain::{TaskPatch, TaskStatus, UserId};
use tasktrack::task::services::CreateTaskRequest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_task_notifies_each_assignee_once(stack: Stack) -> Result<(), eyre::Report> {
    let author = UserId::new();
    let (ana, bruno) = (UserId::new(), UserId::new());
    let task = stack
        .tasks
        .create(
            author,
            CreateTaskRequest::new("Prepare quarterly report").with_assignees([ana, bruno, ana]),
        )
        .await?;

    stack.drain_events().await?;

    let stored = stack.notifications.snapshot();
    eyre::ensure!(stored.len() == 2, "expected 2 notifications, got {}", stored.len());
    for user in [ana, bruno] {
        let record = stored
            .iter()
            .find(|record| record.user_id() == user)
            .ok_or_else(|| eyre::eyre!("no notification for {user}"))?;
        assert_eq!(record.kind(), NotificationType::TaskAssigned);
        assert_eq!(record.related_task_id(), Some(task.id()));
        assert_eq!(
            record.message(),
            "You were assigned to the task: Prepare quarterly report"
        );
        assert!(!record.is_read());
    }
    assert!(stored.iter().all(|record| record.user_id() != author));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_status_transitions_notify_on_update(stack: Stack) -> Result<(), eyre::Report> {
    let author = UserId::new();
    let assignee = UserId::new();
    let task = stack
        .tasks
        .create(
            author,
            CreateTaskRequest::new("Ship release").with_assignees([assignee]),
        )
        .await?;
    stack
        .tasks
        .update(
            task.id(),
            author,
            TaskPatch {
                description: Some("Cut the tag first".to_owned()),
                ..TaskPatch::default()
            },
        )
        .await?;
    stack
        .tasks
        .update_status(task.id(), TaskStatus::InProgress, author)
        .await?;
    stack
        .tasks
        .update_status(task.id(), TaskStatus::InProgress, author)
        .await?;

    stack.drain_events().await?;

    assert_eq!(stack.broker.published_with(RoutingKey::TaskUpdated).len(), 3);
    let updates: Vec<_> = stack
        .notifications
        .snapshot()
        .into_iter()
        .filter(|record| record.kind() == NotificationType::TaskUpdated)
        .collect();
    assert_eq!(updates.len(), 1);
    let update = updates
        .first()
        .ok_or_else(|| eyre::eyre!("missing status notification"))?;
    assert_eq!(update.user_id(), assignee);
    assert_eq!(update.message(), "Task \"Ship release\" changed to: in_progress");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn redelivered_events_do_not_duplicate_notifications(
    stack: Stack,
) -> Result<(), eyre::Report> {
    let assignee = UserId::new();
    stack
        .tasks
        .create(
            UserId::new(),
            CreateTaskRequest::new("Rotate credentials").with_assignees([assignee]),
        )
        .await?;
    let event = stack
        .broker
        .published_with(RoutingKey::TaskCreated)
        .into_iter()
        .next()
        .ok_or_else(|| eyre::eyre!("task:created was not published"))?;
    stack.broker.redeliver(&event);
    stack.broker.redeliver(&event);

    stack.drain_events().await?;

    assert_eq!(stack.notifications.snapshot().len(), 1);
    let settlements = stack.broker.settlements();
    assert_eq!(settlements.len(), 3);
    assert!(
        settlements
            .iter()
            .all(|settlement| *settlement == Settlement::Acked(event.event_id()))
    );
    Ok(())
}

#[rstest]
#[case::disabled(false, 0)]
#[case::enabled(true, 1)]
#[tokio::test(flavor = "multi_thread")]
async fn comment_notifications_follow_the_setting(
    #[case] notify_on_comment: bool,
    #[case] expected: usize,
) -> Result<(), eyre::Report> {
    let stack = Stack::new(FanOutSettings { notify_on_comment });
    let (author, reviewer) = (UserId::new(), UserId::new());
    let task = stack
        .tasks
        .create(
            author,
            CreateTaskRequest::new("Review pull request").with_assignees([author, reviewer]),
        )
        .await?;
    stack
        .tasks
        .add_comment(task.id(), author, "Left some notes")
        .await?;

    stack.drain_events().await?;

    let comments: Vec<_> = stack
        .notifications
        .snapshot()
        .into_iter()
        .filter(|record| record.kind() == NotificationType::CommentAdded)
        .collect();
    assert_eq!(comments.len(), expected);
    assert!(comments.iter().all(|record| record.user_id() == reviewer));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_publishes_nothing(stack: Stack) -> Result<(), eyre::Report> {
    let task = stack
        .tasks
        .create(UserId::new(), CreateTaskRequest::new("Temporary task"))
        .await?;
    stack.tasks.remove(task.id()).await?;

    assert_eq!(stack.broker.published().len(), 1);
    Ok(())
}
