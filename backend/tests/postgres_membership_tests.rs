//! Membership transfers against a live Postgres database.
//!
//! Runs only with the `postgres-repo` feature and `DATABASE_URL` set; each
//! test works in a course key of its own so reruns do not collide.
#![cfg(feature = "postgres-repo")]

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use course_shifts::db::repositories::{PostgresConfig, PostgresRepository};
use course_shifts::db::repository::{MembershipRepository, ShiftGroupRepository};
use course_shifts::models::{CourseKey, MembershipSwap, NewShiftGroup, ShiftGroup, UserId};
use course_shifts::services;

async fn connect() -> Option<PostgresRepository> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(PostgresConfig::with_url(url)))
        .await
        .unwrap()
        .expect("connect to DATABASE_URL");
    Some(repo)
}

fn scratch_course(tag: &str) -> CourseKey {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    CourseKey::new(format!("course-v1:pg+{}+{}-{}", tag, std::process::id(), nanos))
}

async fn group(repo: &PostgresRepository, course: &CourseKey, name: &str, day: u32) -> ShiftGroup {
    let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
    repo.insert_shift_group(&NewShiftGroup::new(course.clone(), name, date))
        .await
        .unwrap()
        .group()
        .clone()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_concurrent_first_transfers_admit_one_winner() {
    let Some(repo) = connect().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let course = scratch_course("race");
    let first = group(&repo, &course, "first", 1).await;
    let second = group(&repo, &course, "second", 8).await;
    let user = UserId::new("test");

    let tasks: Vec<_> = [first.id, second.id]
        .into_iter()
        .cycle()
        .take(8)
        .map(|target| {
            let repo = repo.clone();
            let user = user.clone();
            tokio::spawn(async move { services::transfer_user(&repo, &user, None, Some(target)).await })
        })
        .collect();

    let mut winners = Vec::new();
    for task in tasks {
        if let Ok(Some(membership)) = task.await.unwrap() {
            winners.push(membership.shift_group_id);
        }
    }
    assert_eq!(winners.len(), 1);

    let stored = repo.find_membership(&user, &course).await.unwrap().unwrap();
    assert_eq!(stored.shift_group_id, winners[0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pg_swap_rejects_stale_expectation() {
    let Some(repo) = connect().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let course = scratch_course("stale");
    let first = group(&repo, &course, "first", 1).await;
    let second = group(&repo, &course, "second", 8).await;
    let user = UserId::new("test");

    repo.swap_membership(&user, &course, None, Some(first.id))
        .await
        .unwrap();

    let stale = repo
        .swap_membership(&user, &course, None, Some(second.id))
        .await
        .unwrap();
    assert_eq!(stale, MembershipSwap::Conflict { actual: Some(first.id) });

    let moved = repo
        .swap_membership(&user, &course, Some(first.id), Some(second.id))
        .await
        .unwrap();
    assert!(matches!(moved, MembershipSwap::Swapped(Some(ref m)) if m.shift_group_id == second.id));

    let removed = repo
        .swap_membership(&user, &course, Some(second.id), None)
        .await
        .unwrap();
    assert_eq!(removed, MembershipSwap::Swapped(None));
    assert!(repo.find_membership(&user, &course).await.unwrap().is_none());
}
