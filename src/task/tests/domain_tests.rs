//! Domain validation and patch-diffing tests.

use crate::test_support::SteppingClock;
use crate::task::domain::{
    CommentContent, HistoryAction, Task, TaskChange, TaskPatch, TaskPriority, TaskStatus,
    TaskTitle, TaskValidationError, UserId, parse_due_date,
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn clock() -> SteppingClock {
    SteppingClock::default()
}

#[fixture]
fn task(clock: SteppingClock) -> (Task, SteppingClock) {
    let title = TaskTitle::new("Ship release").expect("valid title");
    let created = Task::new(title, UserId::new(), &clock)
        .with_description("Cut the tag")
        .with_priority(TaskPriority::High);
    (created, clock)
}

#[rstest]
#[case("abc", true)]
#[case("  ab  ", false)]
#[case("ab", false)]
#[case(&"x".repeat(160), true)]
#[case(&"x".repeat(161), false)]
fn title_length_is_checked_after_trimming(#[case] raw: &str, #[case] accepted: bool) {
    assert_eq!(TaskTitle::new(raw).is_ok(), accepted);
}

#[rstest]
fn title_is_stored_trimmed() {
    let title = TaskTitle::new("  Plan sprint ").expect("valid title");
    assert_eq!(title.as_str(), "Plan sprint");
}

#[rstest]
fn new_tasks_default_to_todo_and_medium(clock: SteppingClock) {
    let title = TaskTitle::new("Write docs").expect("valid title");
    let created = Task::new(title, UserId::new(), &clock);

    assert_eq!(created.status(), TaskStatus::Todo);
    assert_eq!(created.priority(), TaskPriority::Medium);
    assert_eq!(created.created_at(), created.updated_at());
}

#[rstest]
fn assignees_are_deduplicated_in_order(clock: SteppingClock) {
    let a = UserId::new();
    let b = UserId::new();
    let title = TaskTitle::new("Pair review").expect("valid title");
    let created = Task::new(title, UserId::new(), &clock).with_assignees([a, b, a]);

    assert_eq!(created.assignee_ids(), &[a, b]);
}

#[rstest]
#[case("2025-03-01T10:30:00Z", "2025-03-01T10:30:00+00:00")]
#[case("2025-03-01T12:30:00+02:00", "2025-03-01T10:30:00+00:00")]
#[case("2025-03-01", "2025-03-01T00:00:00+00:00")]
fn due_dates_accept_timestamps_and_dates(#[case] raw: &str, #[case] expected: &str) {
    let parsed = parse_due_date(raw).expect("parseable due date");
    assert_eq!(parsed.to_rfc3339(), expected);
}

#[rstest]
fn unparseable_due_dates_are_rejected() {
    assert_eq!(
        parse_due_date("next tuesday"),
        Err(TaskValidationError::InvalidDueDate("next tuesday".to_owned()))
    );
}

#[rstest]
fn identical_patch_changes_nothing(task: (Task, SteppingClock)) {
    let (mut current, clock) = task;
    let before = current.clone();
    let patch = TaskPatch {
        title: Some("Ship release".to_owned()),
        description: Some("Cut the tag".to_owned()),
        priority: Some(TaskPriority::High),
        status: Some(TaskStatus::Todo),
        ..TaskPatch::default()
    };

    let changes = current.apply_patch(&patch, &clock).expect("valid patch");

    assert!(changes.is_empty());
    assert_eq!(current, before);
}

#[rstest]
fn reordered_assignees_are_not_a_change(clock: SteppingClock) {
    let a = UserId::new();
    let b = UserId::new();
    let title = TaskTitle::new("Triage bugs").expect("valid title");
    let mut current = Task::new(title, UserId::new(), &clock).with_assignees([a, b]);
    let patch = TaskPatch {
        assignee_ids: Some(vec![b, a]),
        ..TaskPatch::default()
    };

    let changes = current.apply_patch(&patch, &clock).expect("valid patch");

    assert!(changes.is_empty());
    assert_eq!(current.assignee_ids(), &[a, b]);
}

#[rstest]
fn each_changed_field_yields_one_change(task: (Task, SteppingClock)) {
    let (mut current, clock) = task;
    let assignee = UserId::new();
    let patch = TaskPatch {
        title: Some("Ship release 2".to_owned()),
        status: Some(TaskStatus::Done),
        assignee_ids: Some(vec![assignee]),
        ..TaskPatch::default()
    };

    let changes = current.apply_patch(&patch, &clock).expect("valid patch");

    let actions: Vec<HistoryAction> = changes.iter().map(TaskChange::action).collect();
    assert_eq!(
        actions,
        vec![
            HistoryAction::TaskUpdated,
            HistoryAction::StatusChanged,
            HistoryAction::AssigneeChanged,
        ]
    );
    assert!(current.updated_at() > current.created_at());
    assert_eq!(
        changes.first().map(TaskChange::metadata),
        Some(json!({"field": "title", "value": "Ship release 2"}))
    );
    assert_eq!(
        changes.get(1).map(TaskChange::metadata),
        Some(json!({"oldStatus": "todo", "newStatus": "done"}))
    );
}

#[rstest]
fn same_due_date_is_not_a_change(clock: SteppingClock) {
    let due = parse_due_date("2025-06-01").expect("valid date");
    let title = TaskTitle::new("Renew domain").expect("valid title");
    let mut current = Task::new(title, UserId::new(), &clock).with_due_date(due);
    let patch = TaskPatch {
        due_date: Some("2025-06-01T00:00:00Z".to_owned()),
        ..TaskPatch::default()
    };

    let changes = current.apply_patch(&patch, &clock).expect("valid patch");

    assert!(changes.is_empty());
}

#[rstest]
fn invalid_patch_leaves_task_untouched(task: (Task, SteppingClock)) {
    let (mut current, clock) = task;
    let before = current.clone();
    let patch = TaskPatch {
        title: Some("A new title".to_owned()),
        due_date: Some("not a date".to_owned()),
        ..TaskPatch::default()
    };

    let result = current.apply_patch(&patch, &clock);

    assert!(matches!(result, Err(TaskValidationError::InvalidDueDate(_))));
    assert_eq!(current, before);
}

#[rstest]
fn setting_same_status_still_touches_task(task: (Task, SteppingClock)) {
    let (mut current, clock) = task;
    let previous = current.set_status(TaskStatus::Todo, &clock);

    assert_eq!(previous, TaskStatus::Todo);
    assert!(current.updated_at() > current.created_at());
}

#[rstest]
#[case("", Err(TaskValidationError::EmptyComment))]
#[case("   ", Err(TaskValidationError::EmptyComment))]
#[case(&"y".repeat(2001), Err(TaskValidationError::CommentTooLong(2001)))]
fn invalid_comment_content_is_rejected(
    #[case] raw: &str,
    #[case] expected: Result<(), TaskValidationError>,
) {
    assert_eq!(CommentContent::new(raw).map(|_| ()), expected);
}

#[rstest]
fn statuses_round_trip_through_storage_names() {
    for status in [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ] {
        assert_eq!(TaskStatus::try_from(status.as_str()), Ok(status));
    }
    assert!(TaskStatus::try_from("blocked").is_err());
}
