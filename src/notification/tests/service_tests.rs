//! Notification queries and the `notifications.*` request handler.

use std::sync::Arc;

use crate::broker::{
    domain::{RemoteErrorKind, RequestPattern},
    ports::RequestHandler,
};
use crate::notification::{
    adapters::memory::InMemoryNotificationRepository,
    domain::{DedupeKey, NotificationId, NotificationRecord, NotificationType},
    ports::{MockNotificationRepository, NotificationRepository, NotificationRepositoryError},
    services::{NotificationRequestHandler, NotificationService},
};
use crate::task::domain::{TaskId, UserId};
use crate::test_support::SteppingClock;
use rstest::{fixture, rstest};
use serde_json::json;

struct Seeded {
    repository: Arc<InMemoryNotificationRepository>,
    service: Arc<NotificationService<InMemoryNotificationRepository>>,
    user: UserId,
    ids: Vec<NotificationId>,
}

#[fixture]
async fn seeded() -> Seeded {
    let repository = Arc::new(InMemoryNotificationRepository::new());
    let clock = SteppingClock::default();
    let user = UserId::new();
    let records: Vec<NotificationRecord> = (0..3)
        .map(|_| {
            let event_id = uuid::Uuid::new_v4();
            NotificationRecord::new(
                DedupeKey::derive(event_id, user, NotificationType::TaskAssigned),
                user,
                NotificationType::TaskAssigned,
                "You were assigned to the task: Ship release",
                &clock,
            )
            .with_related_task(TaskId::new())
        })
        .collect();
    let stranger = NotificationRecord::new(
        DedupeKey::derive(uuid::Uuid::new_v4(), UserId::new(), NotificationType::TaskUpdated),
        UserId::new(),
        NotificationType::TaskUpdated,
        "Task \"Other\" changed to: done",
        &clock,
    );
    repository
        .insert(&records)
        .await
        .expect("seeding should succeed");
    repository
        .insert(std::slice::from_ref(&stranger))
        .await
        .expect("seeding should succeed");
    Seeded {
        service: Arc::new(NotificationService::new(Arc::clone(&repository))),
        repository,
        user,
        ids: records.iter().map(NotificationRecord::id).collect(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_defaults_to_first_twenty_newest_first(#[future] seeded: Seeded) {
    let seeded = seeded.await;

    let page = seeded
        .service
        .list(seeded.user, None, None)
        .await
        .expect("listing should succeed");

    assert_eq!((page.total, page.limit, page.offset), (3, 20, 0));
    let listed: Vec<NotificationId> = page.items.iter().map(NotificationRecord::id).collect();
    let newest_first: Vec<NotificationId> = seeded.ids.iter().rev().copied().collect();
    assert_eq!(listed, newest_first);
}

#[rstest]
#[case(Some(0), 20)]
#[case(Some(2), 2)]
#[case(None, 20)]
#[case(Some(500), 100)]
#[tokio::test(flavor = "multi_thread")]
async fn list_clamps_limit(
    #[future] seeded: Seeded,
    #[case] requested: Option<u32>,
    #[case] effective: u32,
) {
    let seeded = seeded.await;

    let page = seeded
        .service
        .list(seeded.user, requested, Some(1))
        .await
        .expect("listing should succeed");

    assert_eq!(page.limit, effective);
    assert_eq!(page.offset, 1);
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
}

#[rstest]
#[case(u32::MAX, 0, 3)]
#[case(2, 2, 1)]
#[case(10, 3, 0)]
#[case(10, u32::MAX, 0)]
#[tokio::test(flavor = "multi_thread")]
async fn repository_window_handles_extreme_bounds(
    #[future] seeded: Seeded,
    #[case] limit: u32,
    #[case] offset: u32,
    #[case] returned: usize,
) {
    let seeded = seeded.await;

    let (items, total) = seeded
        .repository
        .list_for_user(seeded.user, limit, offset)
        .await
        .expect("listing should succeed");

    assert_eq!(total, 3);
    assert_eq!(items.len(), returned);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_read_is_scoped_to_the_recipient(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let target = *seeded.ids.first().expect("seeded notification");

    let foreign = seeded
        .service
        .mark_read(target, UserId::new())
        .await
        .expect("mark read should succeed");
    let owned = seeded
        .service
        .mark_read(target, seeded.user)
        .await
        .expect("mark read should succeed");

    assert!(foreign.is_none());
    assert!(owned.is_some_and(|record| record.is_read()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_all_read_counts_only_unread(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let target = *seeded.ids.first().expect("seeded notification");
    seeded
        .service
        .mark_read(target, seeded.user)
        .await
        .expect("mark read should succeed");

    let changed = seeded
        .service
        .mark_all_read(seeded.user)
        .await
        .expect("mark all read should succeed");

    assert_eq!(changed, 2);
    assert!(
        seeded
            .repository
            .snapshot()
            .iter()
            .filter(|record| record.user_id() == seeded.user)
            .all(NotificationRecord::is_read)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_only_owned_records(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let target = *seeded.ids.first().expect("seeded notification");

    let foreign = seeded
        .service
        .delete(target, UserId::new())
        .await
        .expect("delete should succeed");
    let owned = seeded
        .service
        .delete(target, seeded.user)
        .await
        .expect("delete should succeed");

    assert!(!foreign);
    assert!(owned);
    let remaining = seeded
        .service
        .get(target, seeded.user)
        .await
        .expect("lookup should succeed");
    assert!(remaining.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn handler_lists_with_wire_shape(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let handler = NotificationRequestHandler::new(Arc::clone(&seeded.service));

    let reply = handler
        .handle(
            RequestPattern::NotificationGetByUser,
            json!({"userId": seeded.user, "limit": 1}),
        )
        .await
        .expect("listing should succeed");

    assert_eq!(reply["total"], json!(3));
    assert_eq!(reply["limit"], json!(1));
    assert_eq!(reply["offset"], json!(0));
    let first = &reply["items"][0];
    assert_eq!(first["type"], json!("task_assigned"));
    assert_eq!(first["isRead"], json!(false));
    assert_eq!(first["userId"], json!(seeded.user));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn handler_reports_missing_notification(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let handler = NotificationRequestHandler::new(Arc::clone(&seeded.service));

    let result = handler
        .handle(
            RequestPattern::NotificationMarkAsRead,
            json!({"notificationId": NotificationId::new(), "userId": seeded.user}),
        )
        .await;

    assert!(matches!(result, Err(err) if err.kind == RemoteErrorKind::NotFound));
}

#[rstest]
#[case(RequestPattern::TaskCreate, RemoteErrorKind::UnknownPattern)]
#[case(RequestPattern::NotificationMarkAllAsRead, RemoteErrorKind::Validation)]
#[tokio::test(flavor = "multi_thread")]
async fn handler_rejects_bad_requests(
    #[future] seeded: Seeded,
    #[case] pattern: RequestPattern,
    #[case] expected: RemoteErrorKind,
) {
    let seeded = seeded.await;
    let handler = NotificationRequestHandler::new(Arc::clone(&seeded.service));

    let result = handler.handle(pattern, json!({"unexpected": true})).await;

    assert!(matches!(result, Err(err) if err.kind == expected));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storage_failures_become_storage_rejections() {
    let mut repository = MockNotificationRepository::new();
    repository.expect_mark_all_read().returning(|_| {
        Err(NotificationRepositoryError::persistence(std::io::Error::other(
            "database offline",
        )))
    });
    let handler =
        NotificationRequestHandler::new(Arc::new(NotificationService::new(Arc::new(repository))));

    let result = handler
        .handle(
            RequestPattern::NotificationMarkAllAsRead,
            json!({"userId": UserId::new()}),
        )
        .await;

    assert!(matches!(result, Err(err) if err.kind == RemoteErrorKind::Storage));
}
