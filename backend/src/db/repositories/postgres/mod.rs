//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - Uniqueness enforced by table constraints, multi-row operations in one transaction
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    CourseRepository, ErrorContext, MembershipRepository, PlanRepository, RepositoryError,
    RepositoryResult, SettingsRepository, ShiftGroupRepository,
};
use crate::models::{
    CourseKey, CourseUserGroup, CourseUserGroupId, Membership, MembershipSwap, NewShiftGroup,
    PlannedRun, PlannedRunId, ShiftGroup, ShiftGroupId, ShiftInsert, ShiftSettings, UserId,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times with exponential backoff when the
    /// error is retryable (connection errors, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

/// Insert a shift group and its user group inside an open transaction.
fn insert_shift_group_tx(
    tx: &mut PgConnection,
    new: &NewShiftGroup,
) -> RepositoryResult<ShiftInsert> {
    let course_key = new.course_key.as_str();

    let same_date = course_shift_groups::table
        .filter(course_shift_groups::course_key.eq(course_key))
        .filter(course_shift_groups::start_date.eq(new.start_date))
        .select(ShiftGroupRow::as_select())
        .first::<ShiftGroupRow>(tx)
        .optional()?;
    if let Some(row) = same_date {
        let group = ShiftGroup::from(row);
        return Ok(if group.name == new.name {
            ShiftInsert::Existing(group)
        } else {
            ShiftInsert::DateTaken(group)
        });
    }

    let same_name = course_shift_groups::table
        .filter(course_shift_groups::course_key.eq(course_key))
        .filter(course_shift_groups::name.eq(&new.name))
        .select(ShiftGroupRow::as_select())
        .first::<ShiftGroupRow>(tx)
        .optional()?;
    if let Some(row) = same_name {
        return Ok(ShiftInsert::NameTaken(row.into()));
    }

    let user_group: UserGroupRow = diesel::insert_into(course_user_groups::table)
        .values(&NewUserGroupRow {
            course_key: course_key.to_string(),
            name: new.name.clone(),
        })
        .returning(UserGroupRow::as_returning())
        .get_result(tx)?;

    let row: ShiftGroupRow = diesel::insert_into(course_shift_groups::table)
        .values(&NewShiftGroupRow {
            course_key: course_key.to_string(),
            name: new.name.clone(),
            start_date: new.start_date,
            user_group_id: user_group.id,
        })
        .returning(ShiftGroupRow::as_returning())
        .get_result(tx)?;

    Ok(ShiftInsert::Created(row.into()))
}

/// Reasons a launch transaction is rolled back.
enum LaunchAbort {
    Conflict(Vec<ShiftInsert>),
    Failed(RepositoryError),
}

impl From<diesel::result::Error> for LaunchAbort {
    fn from(err: diesel::result::Error) -> Self {
        LaunchAbort::Failed(err.into())
    }
}

impl From<RepositoryError> for LaunchAbort {
    fn from(err: RepositoryError) -> Self {
        LaunchAbort::Failed(err)
    }
}

#[async_trait]
impl CourseRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn register_course(
        &self,
        course_key: &CourseKey,
        start: NaiveDate,
    ) -> RepositoryResult<()> {
        let row = CourseRow {
            course_key: course_key.as_str().to_string(),
            start_date: start,
        };
        self.with_conn(move |conn| {
            diesel::insert_into(courses::table)
                .values(&row)
                .on_conflict(courses::course_key)
                .do_update()
                .set(courses::start_date.eq(excluded(courses::start_date)))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn course_start(&self, course_key: &CourseKey) -> RepositoryResult<Option<NaiveDate>> {
        let key = course_key.as_str().to_string();
        self.with_conn(move |conn| {
            Ok(courses::table
                .filter(courses::course_key.eq(&key))
                .select(courses::start_date)
                .first::<NaiveDate>(conn)
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl ShiftGroupRepository for PostgresRepository {
    async fn insert_shift_group(&self, group: &NewShiftGroup) -> RepositoryResult<ShiftInsert> {
        let group = group.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| insert_shift_group_tx(tx, &group))
        })
        .await
    }

    async fn get_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<Option<ShiftGroup>> {
        self.with_conn(move |conn| {
            Ok(course_shift_groups::table
                .find(id.value())
                .select(ShiftGroupRow::as_select())
                .first::<ShiftGroupRow>(conn)
                .optional()?
                .map(ShiftGroup::from))
        })
        .await
    }

    async fn list_course_shifts(&self, course_key: &CourseKey) -> RepositoryResult<Vec<ShiftGroup>> {
        let key = course_key.as_str().to_string();
        self.with_conn(move |conn| {
            let rows = course_shift_groups::table
                .filter(course_shift_groups::course_key.eq(&key))
                .order((course_shift_groups::start_date, course_shift_groups::id))
                .select(ShiftGroupRow::as_select())
                .load::<ShiftGroupRow>(conn)?;
            Ok(rows.into_iter().map(ShiftGroup::from).collect())
        })
        .await
    }

    async fn delete_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let user_group_id = diesel::delete(course_shift_groups::table.find(id.value()))
                    .returning(course_shift_groups::user_group_id)
                    .get_result::<i64>(tx)
                    .optional()?;
                match user_group_id {
                    Some(user_group_id) => {
                        diesel::delete(course_user_groups::table.find(user_group_id))
                            .execute(tx)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            })
        })
        .await
    }

    async fn get_user_group(
        &self,
        id: CourseUserGroupId,
    ) -> RepositoryResult<Option<CourseUserGroup>> {
        self.with_conn(move |conn| {
            Ok(course_user_groups::table
                .find(id.value())
                .select(UserGroupRow::as_select())
                .first::<UserGroupRow>(conn)
                .optional()?
                .map(CourseUserGroup::from))
        })
        .await
    }

    async fn list_user_groups(
        &self,
        course_key: &CourseKey,
    ) -> RepositoryResult<Vec<CourseUserGroup>> {
        let key = course_key.as_str().to_string();
        self.with_conn(move |conn| {
            let rows = course_user_groups::table
                .filter(course_user_groups::course_key.eq(&key))
                .order(course_user_groups::id)
                .select(UserGroupRow::as_select())
                .load::<UserGroupRow>(conn)?;
            Ok(rows.into_iter().map(CourseUserGroup::from).collect())
        })
        .await
    }

    async fn delete_user_group(&self, id: CourseUserGroupId) -> RepositoryResult<bool> {
        // Shift group and memberships go through ON DELETE CASCADE.
        self.with_conn(move |conn| {
            let deleted = diesel::delete(course_user_groups::table.find(id.value())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl MembershipRepository for PostgresRepository {
    async fn find_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
    ) -> RepositoryResult<Option<Membership>> {
        let user = user.as_str().to_string();
        let key = course_key.as_str().to_string();
        self.with_conn(move |conn| {
            Ok(course_shift_memberships::table
                .filter(course_shift_memberships::user_id.eq(&user))
                .filter(course_shift_memberships::course_key.eq(&key))
                .select(MembershipRow::as_select())
                .first::<MembershipRow>(conn)
                .optional()?
                .map(Membership::from))
        })
        .await
    }

    async fn swap_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
        expected: Option<ShiftGroupId>,
        target: Option<ShiftGroupId>,
    ) -> RepositoryResult<MembershipSwap> {
        let user = user.clone();
        let course_key = course_key.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let user_s = user.as_str();
                let key_s = course_key.as_str();

                // Row lock serializes concurrent swaps of an existing membership.
                let actual = course_shift_memberships::table
                    .filter(course_shift_memberships::user_id.eq(user_s))
                    .filter(course_shift_memberships::course_key.eq(key_s))
                    .select(course_shift_memberships::shift_group_id)
                    .for_update()
                    .first::<i64>(tx)
                    .optional()?
                    .map(ShiftGroupId::new);
                if actual != expected {
                    return Ok(MembershipSwap::Conflict { actual });
                }

                let Some(group_id) = target else {
                    if let Some(current) = expected {
                        diesel::delete(
                            course_shift_memberships::table
                                .filter(course_shift_memberships::user_id.eq(user_s))
                                .filter(course_shift_memberships::course_key.eq(key_s))
                                .filter(course_shift_memberships::shift_group_id.eq(current.value())),
                        )
                        .execute(tx)?;
                    }
                    return Ok(MembershipSwap::Swapped(None));
                };

                let in_course = course_shift_groups::table
                    .filter(course_shift_groups::id.eq(group_id.value()))
                    .filter(course_shift_groups::course_key.eq(key_s))
                    .select(course_shift_groups::id)
                    .for_share()
                    .first::<i64>(tx)
                    .optional()?
                    .is_some();
                if !in_course {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Shift group {} not found in course {}", group_id, course_key),
                        ErrorContext::new("swap_membership")
                            .with_entity("shift_group")
                            .with_entity_id(group_id),
                    ));
                }

                let row = MembershipRow {
                    user_id: user_s.to_string(),
                    course_key: key_s.to_string(),
                    shift_group_id: group_id.value(),
                };
                let written = match expected {
                    // No row to lock: a concurrent first insert is caught by
                    // the primary key. The savepoint keeps the transaction
                    // usable for the re-read.
                    None => match tx.transaction::<_, diesel::result::Error, _>(|sp| {
                        diesel::insert_into(course_shift_memberships::table)
                            .values(&row)
                            .execute(sp)
                    }) {
                        Ok(n) => n,
                        Err(diesel::result::Error::DatabaseError(
                            DatabaseErrorKind::UniqueViolation,
                            _,
                        )) => 0,
                        Err(e) => return Err(e.into()),
                    },
                    Some(current) => diesel::update(
                        course_shift_memberships::table
                            .filter(course_shift_memberships::user_id.eq(user_s))
                            .filter(course_shift_memberships::course_key.eq(key_s))
                            .filter(course_shift_memberships::shift_group_id.eq(current.value())),
                    )
                    .set(course_shift_memberships::shift_group_id.eq(group_id.value()))
                    .execute(tx)?,
                };
                if written == 0 {
                    let actual = course_shift_memberships::table
                        .filter(course_shift_memberships::user_id.eq(user_s))
                        .filter(course_shift_memberships::course_key.eq(key_s))
                        .select(course_shift_memberships::shift_group_id)
                        .first::<i64>(tx)
                        .optional()?
                        .map(ShiftGroupId::new);
                    return Ok(MembershipSwap::Conflict { actual });
                }
                Ok(MembershipSwap::Swapped(Some(row.into())))
            })
        })
        .await
    }

    async fn list_group_members(&self, group_id: ShiftGroupId) -> RepositoryResult<Vec<UserId>> {
        self.with_conn(move |conn| {
            let users = course_shift_memberships::table
                .filter(course_shift_memberships::shift_group_id.eq(group_id.value()))
                .order(course_shift_memberships::user_id)
                .select(course_shift_memberships::user_id)
                .load::<String>(conn)?;
            Ok(users.into_iter().map(UserId::new).collect())
        })
        .await
    }
}

#[async_trait]
impl SettingsRepository for PostgresRepository {
    async fn get_or_create_settings(
        &self,
        course_key: &CourseKey,
        today: NaiveDate,
    ) -> RepositoryResult<ShiftSettings> {
        let defaults = SettingsRow::try_from(&ShiftSettings::new_default(course_key.clone(), today))?;
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                diesel::insert_into(course_shift_settings::table)
                    .values(&defaults)
                    .on_conflict(course_shift_settings::course_key)
                    .do_nothing()
                    .execute(tx)?;
                let row = course_shift_settings::table
                    .find(defaults.course_key.as_str())
                    .select(SettingsRow::as_select())
                    .first::<SettingsRow>(tx)?;
                ShiftSettings::try_from(row)
            })
        })
        .await
    }

    async fn save_settings(&self, settings: &ShiftSettings) -> RepositoryResult<ShiftSettings> {
        let row = SettingsRow::try_from(settings)?;
        self.with_conn(move |conn| {
            let saved = diesel::insert_into(course_shift_settings::table)
                .values(&row)
                .on_conflict(course_shift_settings::course_key)
                .do_update()
                .set(&row)
                .returning(SettingsRow::as_returning())
                .get_result::<SettingsRow>(conn)?;
            ShiftSettings::try_from(saved)
        })
        .await
    }

    async fn delete_settings(&self, course_key: &CourseKey) -> RepositoryResult<bool> {
        let key = course_key.as_str().to_string();
        self.with_conn(move |conn| {
            let deleted = diesel::delete(course_shift_settings::table.find(key.as_str())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_enabled_courses(&self) -> RepositoryResult<Vec<CourseKey>> {
        self.with_conn(|conn| {
            let keys = course_shift_settings::table
                .filter(course_shift_settings::is_shift_enabled.eq(true))
                .order(course_shift_settings::course_key)
                .select(course_shift_settings::course_key)
                .load::<String>(conn)?;
            Ok(keys.into_iter().map(CourseKey::new).collect())
        })
        .await
    }
}

#[async_trait]
impl PlanRepository for PostgresRepository {
    async fn insert_plan(
        &self,
        course_key: &CourseKey,
        start_date: NaiveDate,
        name: Option<&str>,
    ) -> RepositoryResult<PlannedRun> {
        let row = NewPlannedRunRow {
            course_key: course_key.as_str().to_string(),
            start_date,
            name: name.map(str::to_string),
        };
        self.with_conn(move |conn| {
            let inserted = diesel::insert_into(course_shift_planned_runs::table)
                .values(&row)
                .returning(PlannedRunRow::as_returning())
                .get_result::<PlannedRunRow>(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("insert_plan")
                })?;
            Ok(inserted.into())
        })
        .await
    }

    async fn get_plan(&self, id: PlannedRunId) -> RepositoryResult<Option<PlannedRun>> {
        self.with_conn(move |conn| {
            Ok(course_shift_planned_runs::table
                .find(id.value())
                .select(PlannedRunRow::as_select())
                .first::<PlannedRunRow>(conn)
                .optional()?
                .map(PlannedRun::from))
        })
        .await
    }

    async fn list_course_plans(&self, course_key: &CourseKey) -> RepositoryResult<Vec<PlannedRun>> {
        let key = course_key.as_str().to_string();
        self.with_conn(move |conn| {
            let rows = course_shift_planned_runs::table
                .filter(course_shift_planned_runs::course_key.eq(&key))
                .order((
                    course_shift_planned_runs::start_date,
                    course_shift_planned_runs::id,
                ))
                .select(PlannedRunRow::as_select())
                .load::<PlannedRunRow>(conn)?;
            Ok(rows.into_iter().map(PlannedRun::from).collect())
        })
        .await
    }

    async fn delete_plan(&self, id: PlannedRunId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(course_shift_planned_runs::table.find(id.value())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn commit_launches(
        &self,
        course_key: &CourseKey,
        groups: &[NewShiftGroup],
        consumed_plans: &[PlannedRunId],
    ) -> RepositoryResult<Vec<ShiftInsert>> {
        let course_key = course_key.clone();
        let groups = groups.to_vec();
        let consumed_plans = consumed_plans.to_vec();
        self.with_conn(move |conn| {
            let result = conn.transaction::<_, LaunchAbort, _>(|tx| {
                for plan_id in &consumed_plans {
                    let deleted = diesel::delete(
                        course_shift_planned_runs::table
                            .filter(course_shift_planned_runs::id.eq(plan_id.value()))
                            .filter(course_shift_planned_runs::course_key.eq(course_key.as_str())),
                    )
                    .execute(tx)?;
                    if deleted == 0 {
                        return Err(LaunchAbort::Failed(RepositoryError::not_found_with_context(
                            format!("Planned run {} not found in course {}", plan_id, course_key),
                            ErrorContext::new("commit_launches")
                                .with_entity("planned_run")
                                .with_entity_id(plan_id),
                        )));
                    }
                }

                let mut outcomes = Vec::with_capacity(groups.len());
                for group in &groups {
                    let outcome = insert_shift_group_tx(tx, group)?;
                    let conflict = outcome.is_conflict();
                    outcomes.push(outcome);
                    if conflict {
                        return Err(LaunchAbort::Conflict(outcomes));
                    }
                }
                Ok(outcomes)
            });

            match result {
                Ok(outcomes) | Err(LaunchAbort::Conflict(outcomes)) => Ok(outcomes),
                Err(LaunchAbort::Failed(e)) => Err(e),
            }
        })
        .await
    }
}
