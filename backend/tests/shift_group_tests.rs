//! Integration tests for shift group creation and deletion.

mod support;

use course_shifts::db::repository::ShiftGroupRepository;
use course_shifts::services::{self, ShiftError};
use support::{course, date, fixture, other_course};

#[tokio::test]
async fn test_shift_group_creation() {
    let (repo, clock) = fixture(date(2026, 3, 1));

    let groups = services::get_course_shifts(&repo, &course()).await.unwrap();
    assert!(groups.is_empty(), "Course has shift groups at creation");

    let (group, created) =
        services::create_shift_group(&repo, &clock, &course(), "test_shift_group", None)
            .await
            .unwrap();
    assert!(created);

    let groups = services::get_course_shifts(&repo, &course()).await.unwrap();
    assert_eq!(groups, vec![group.clone()]);

    services::delete_shift_group(&repo, group.id).await.unwrap();
    let groups = services::get_course_shifts(&repo, &course()).await.unwrap();
    assert!(groups.is_empty(), "Course has shift groups after group deletion");
}

#[tokio::test]
async fn test_shift_group_deletion_cascades_both_ways() {
    let (repo, clock) = fixture(date(2026, 3, 1));

    let (group, _) =
        services::create_shift_group(&repo, &clock, &course(), "test_shift_group", None)
            .await
            .unwrap();
    assert_eq!(repo.list_user_groups(&course()).await.unwrap().len(), 1);

    // Deleting the user group removes the shift group.
    services::delete_user_group(&repo, group.user_group_id)
        .await
        .unwrap();
    assert!(services::get_course_shifts(&repo, &course())
        .await
        .unwrap()
        .is_empty());

    // Deleting the shift group removes the user group.
    let (group, _) =
        services::create_shift_group(&repo, &clock, &course(), "test_shift_group", None)
            .await
            .unwrap();
    services::delete_shift_group(&repo, group.id).await.unwrap();
    assert!(repo.list_user_groups(&course()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_shift_creation_conflicts() {
    let (repo, clock) = fixture(date(2026, 3, 1));

    let (group, _) =
        services::create_shift_group(&repo, &clock, &course(), "test_shift_group", None)
            .await
            .unwrap();

    let err = services::create_shift_group(&repo, &clock, &course(), "test_shift_group2", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ShiftError::Validation(_)));
    let msg = err.to_string();
    for part in ["Shift for course", "with date", "already exists"] {
        assert!(msg.contains(part), "missing '{}' in '{}'", part, msg);
    }

    // Same (name, course, date) returns the stored group.
    let (same, created) =
        services::create_shift_group(&repo, &clock, &course(), "test_shift_group", None)
            .await
            .unwrap();
    assert!(!created);
    assert_eq!(same.id, group.id);
    assert_eq!(repo.shift_count(), 1);
}

#[tokio::test]
async fn test_same_name_on_other_date_rejected() {
    let (repo, clock) = fixture(date(2026, 3, 1));

    services::create_shift_group(&repo, &clock, &course(), "spring", None)
        .await
        .unwrap();
    let err = services::create_shift_group(
        &repo,
        &clock,
        &course(),
        "spring",
        Some(date(2026, 3, 8)),
    )
    .await
    .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("spring"));
    assert!(msg.contains("2026-03-01"));
    assert_eq!(repo.shift_count(), 1);
}

#[tokio::test]
async fn test_courses_do_not_share_dates_or_names() {
    let (repo, clock) = fixture(date(2026, 3, 1));

    let (a, a_created) = services::create_shift_group(&repo, &clock, &course(), "spring", None)
        .await
        .unwrap();
    let (b, b_created) =
        services::create_shift_group(&repo, &clock, &other_course(), "spring", None)
            .await
            .unwrap();

    assert!(a_created && b_created);
    assert_ne!(a.id, b.id);
    assert_ne!(a.user_group_id, b.user_group_id);
}

#[tokio::test]
async fn test_course_shifts_ordered_by_date() {
    let (repo, clock) = fixture(date(2026, 3, 1));

    for (name, day) in [("late", 20), ("early", 2), ("middle", 10)] {
        services::create_shift_group(&repo, &clock, &course(), name, Some(date(2026, 3, day)))
            .await
            .unwrap();
    }

    let names: Vec<String> = services::get_course_shifts(&repo, &course())
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(names, vec!["early", "middle", "late"]);
}

#[tokio::test]
async fn test_members_of_missing_group_not_found() {
    let (repo, _) = fixture(date(2026, 3, 1));

    let err = services::get_shift_members(&repo, course_shifts::models::ShiftGroupId::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ShiftError::NotFound(_)));
}
