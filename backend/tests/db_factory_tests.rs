//! Tests for db::factory and db::repo_config - repository creation and configuration.

mod support;

use std::io::Write;
use std::str::FromStr;

use course_shifts::db::factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
use course_shifts::db::repository::CourseRepository;
use course_shifts::db::RepositoryConfig;
use course_shifts::models::CourseKey;
use support::date;

#[test]
fn test_repository_type_from_str() {
    for s in ["postgres", "POSTGRES", "pg"] {
        assert_eq!(RepositoryType::from_str(s).unwrap(), RepositoryType::Postgres);
    }
    for s in ["local", "LOCAL", "memory"] {
        assert_eq!(RepositoryType::from_str(s).unwrap(), RepositoryType::Local);
    }

    let result = RepositoryType::from_str("invalid");
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", Some("postgres://localhost/test")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_repository_type_from_env_explicit_wins() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/test")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_invalid_defaults_to_local() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("invalid"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}

#[tokio::test]
async fn test_create_local_via_factory() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_create_postgres_without_feature_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("feature not enabled"));
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_create_postgres_without_config_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("requires PostgresConfig"));
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_from_config_file_seeds_courses() {
    let file = write_config(
        r#"
[repository]
type = "local"

[shifts]
sweep_interval_sec = 120

[[courses]]
key = "course-v1:org+num+run"
start_date = "2026-09-01"

[[courses]]
key = "org/other/run"
start_date = "2026-10-05"
"#,
    );

    let config = RepositoryConfig::from_file(file.path()).unwrap();
    assert_eq!(config.shifts.sweep_interval_sec, 120);

    let repo = RepositoryFactory::from_config_file(file.path()).await.unwrap();
    assert_eq!(
        repo.course_start(&CourseKey::new("course-v1:org+num+run"))
            .await
            .unwrap(),
        Some(date(2026, 9, 1))
    );
    assert_eq!(
        repo.course_start(&CourseKey::new("org/other/run"))
            .await
            .unwrap(),
        Some(date(2026, 10, 5))
    );
    assert_eq!(
        repo.course_start(&CourseKey::new("org/unknown/run"))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_builder_from_config_file() {
    let file = write_config(
        r#"
[repository]
type = "memory"

[[courses]]
key = "org/num/run"
start_date = "2026-01-10"
"#,
    );

    let repo = RepositoryBuilder::new()
        .from_config_file(file.path())
        .unwrap()
        .build()
        .await
        .unwrap();
    assert_eq!(
        repo.course_start(&CourseKey::new("org/num/run")).await.unwrap(),
        Some(date(2026, 1, 10))
    );
}

#[test]
fn test_config_errors() {
    let missing = RepositoryConfig::from_file("/nonexistent/repository.toml");
    assert!(missing.unwrap_err().to_string().contains("Failed to read"));

    let file = write_config("[repository\ntype = ");
    let broken = RepositoryConfig::from_file(file.path());
    assert!(broken.unwrap_err().to_string().contains("Failed to parse"));

    let file = write_config("[repository]\ntype = \"sqlite\"\n");
    let config = RepositoryConfig::from_file(file.path()).unwrap();
    assert!(config.repository_type().is_err());
}
