//! PostgreSQL host directory.
//!
//! Reads the host platform's own tables. All table names carry the
//! configured prefix (`mdl_` by default).
//!
//! Tables used:
//! - `config`, `config_plugins` - site settings and enabled plugin list
//! - `course`, `user`, `user_enrolments` - event subjects
//! - `user_info_field`, `user_info_data` - custom profile fields
//! - `enrol` - notifier instances, one per course

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DirectoryConfig;
use crate::enrolment::{
    CourseContext, EnrolmentContext, InstanceStatus, ProfileDatatype, ProfileField, SiteConfig,
    UserContext,
};
use crate::instance::InstanceRecord;

use super::directory::{DirectoryError, DirectoryResult, HostDirectory};

type CourseRow = (i64, String, String, String, i64, i64, i16);
type UserRow = (i64, String, String, String, String, String, String, String, i16, i16);
type InstanceRow = (
    i64,
    i64,
    Option<String>,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

pub struct PostgresDirectory {
    pool: PgPool,
    prefix: String,
    plugin_name: String,
    wwwroot: String,
}

impl PostgresDirectory {
    /// Connect to the host database
    pub async fn connect(
        config: &DirectoryConfig,
        plugin_name: &str,
        wwwroot: &str,
    ) -> DirectoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await?;

        tracing::info!(
            pool_size = config.pool_size,
            table_prefix = %config.table_prefix,
            "Host database connection pool created"
        );

        Ok(Self::with_pool(pool, &config.table_prefix, plugin_name, wwwroot))
    }

    pub fn with_pool(pool: PgPool, prefix: &str, plugin_name: &str, wwwroot: &str) -> Self {
        Self {
            pool,
            prefix: prefix.to_string(),
            plugin_name: plugin_name.to_string(),
            wwwroot: wwwroot.to_string(),
        }
    }

    fn table(&self, name: &str) -> String {
        quoted_table(&self.prefix, name)
    }

    /// Component name the host files this plugin's settings under
    fn component(&self) -> String {
        format!("enrol_{}", self.plugin_name)
    }

    async fn profile_fields(&self, user_id: i64) -> DirectoryResult<BTreeMap<String, ProfileField>> {
        let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(&format!(
            "SELECT f.shortname, f.datatype, d.data \
             FROM {fields} f \
             LEFT JOIN {data} d ON d.fieldid = f.id AND d.userid = $1",
            fields = self.table("user_info_field"),
            data = self.table("user_info_data"),
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(shortname, datatype, data)| {
                (
                    shortname,
                    ProfileField {
                        datatype: ProfileDatatype::parse(&datatype),
                        value: data.unwrap_or_default(),
                    },
                )
            })
            .collect())
    }
}

/// Prefixed table name as a quoted identifier
fn quoted_table(prefix: &str, name: &str) -> String {
    let ident = format!("{}{}", prefix, name).replace('"', "\"\"");
    format!("\"{}\"", ident)
}

fn instance_from_row(row: InstanceRow) -> DirectoryResult<InstanceRecord> {
    let (
        id,
        course_id,
        name,
        status,
        customint1,
        customint2,
        customint3,
        customtext1,
        customtext2,
        customtext3,
        time_created,
        time_modified,
    ) = row;

    let status = InstanceStatus::try_from(status).map_err(DirectoryError::InvalidRecord)?;
    let flag = |v: Option<i64>| v.unwrap_or(0) != 0;

    Ok(InstanceRecord {
        id,
        course_id,
        name,
        status,
        customint1: flag(customint1),
        customint2: flag(customint2),
        customint3: flag(customint3),
        customtext1: customtext1.unwrap_or_default(),
        customtext2: customtext2.unwrap_or_default(),
        customtext3: customtext3.unwrap_or_default(),
        time_created,
        time_modified,
    })
}

#[async_trait]
impl HostDirectory for PostgresDirectory {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn site_config(&self) -> DirectoryResult<SiteConfig> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(&format!(
            "SELECT name, value FROM {} WHERE plugin = $1",
            self.table("config_plugins")
        ))
        .bind(self.component())
        .fetch_all(&self.pool)
        .await?;

        let settings: HashMap<String, String> = rows
            .into_iter()
            .map(|(name, value)| (name, value.unwrap_or_default()))
            .collect();

        let enabled: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT value FROM {} WHERE name = 'enrol_plugins_enabled'",
            self.table("config")
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(SiteConfig::from_host_settings(
            &settings,
            enabled.map(|(v,)| v).as_deref().unwrap_or(""),
        ))
    }

    async fn course(&self, course_id: i64) -> DirectoryResult<Option<CourseContext>> {
        let row: Option<CourseRow> = sqlx::query_as(&format!(
            "SELECT id, fullname, shortname, COALESCE(idnumber, ''), startdate, enddate, visible \
             FROM {} WHERE id = $1",
            self.table("course")
        ))
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, full_name, short_name, id_number, start_date, end_date, visible)| CourseContext {
                id,
                full_name,
                short_name,
                id_number,
                start_date,
                end_date,
                visible: visible != 0,
                url: CourseContext::view_url(&self.wwwroot, id),
            },
        ))
    }

    async fn user(&self, user_id: i64) -> DirectoryResult<Option<UserContext>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT id, username, firstname, lastname, email, city, country, idnumber, deleted, suspended \
             FROM {} WHERE id = $1",
            self.table("user")
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, username, first_name, last_name, email, city, country, id_number, deleted, suspended)) =
            row
        else {
            return Ok(None);
        };

        let profile_fields = self.profile_fields(id).await?;

        Ok(Some(UserContext {
            id,
            username,
            first_name,
            last_name,
            email,
            city,
            country,
            id_number,
            deleted: deleted != 0,
            suspended: suspended != 0,
            profile_fields,
        }))
    }

    async fn enrolment(&self, enrolment_id: i64) -> DirectoryResult<Option<EnrolmentContext>> {
        let row: Option<(i64, i64, i64, i64, i64)> = sqlx::query_as(&format!(
            "SELECT id, timecreated, timemodified, timestart, timeend FROM {} WHERE id = $1",
            self.table("user_enrolments")
        ))
        .bind(enrolment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, time_created, time_modified, time_start, time_end)| EnrolmentContext {
                id,
                time_created,
                time_modified,
                time_start,
                time_end,
            },
        ))
    }

    async fn instance_for_course(&self, course_id: i64) -> DirectoryResult<Option<InstanceRecord>> {
        let row: Option<InstanceRow> = sqlx::query_as(&format!(
            "SELECT id, courseid, name, status, customint1, customint2, customint3, \
                    customtext1, customtext2, customtext3, timecreated, timemodified \
             FROM {} WHERE enrol = $1 AND courseid = $2 \
             ORDER BY sortorder, id LIMIT 1",
            self.table("enrol")
        ))
        .bind(&self.plugin_name)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(instance_from_row).transpose()
    }

    async fn profile_field_shortnames(&self) -> DirectoryResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT shortname FROM {} ORDER BY sortorder, shortname",
            self.table("user_info_field")
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn insert_instance(&self, record: &InstanceRecord) -> DirectoryResult<Option<i64>> {
        let table = self.table("enrol");
        let mut tx = self.pool.begin().await?;

        // Serialize adds for one course until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), $2::int4)")
            .bind(&self.plugin_name)
            .bind(record.course_id)
            .execute(&mut *tx)
            .await?;

        let inserted: Option<(i64,)> = sqlx::query_as(&format!(
            "INSERT INTO {table} (enrol, status, courseid, sortorder, name, enrolstartdate, enrolenddate, \
                                  customint1, customint2, customint3, customtext1, customtext2, customtext3, \
                                  timecreated, timemodified) \
             SELECT $1, $2, $3, \
                    (SELECT COALESCE(MAX(sortorder), -1) + 1 FROM {table} WHERE courseid = $3), \
                    $4, 0, 0, $5, $6, $7, $8, $9, $10, $11, $12 \
             WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE enrol = $1 AND courseid = $3) \
             RETURNING id"
        ))
        .bind(&self.plugin_name)
        .bind(record.status.as_i64())
        .bind(record.course_id)
        .bind(&record.name)
        .bind(record.customint1 as i64)
        .bind(record.customint2 as i64)
        .bind(record.customint3 as i64)
        .bind(&record.customtext1)
        .bind(&record.customtext2)
        .bind(&record.customtext3)
        .bind(record.time_created)
        .bind(record.time_modified)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        match inserted {
            Some((id,)) => {
                tracing::info!(instance_id = id, course_id = record.course_id, "Notifier instance created");
                Ok(Some(id))
            }
            None => {
                tracing::debug!(course_id = record.course_id, "Course already has a notifier instance");
                Ok(None)
            }
        }
    }

    async fn update_instance(&self, record: &InstanceRecord) -> DirectoryResult<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET status = $1, name = $2, customint1 = $3, customint2 = $4, customint3 = $5, \
                    customtext1 = $6, customtext2 = $7, customtext3 = $8, timemodified = $9 \
             WHERE id = $10 AND courseid = $11 AND enrol = $12",
            self.table("enrol")
        ))
        .bind(record.status.as_i64())
        .bind(&record.name)
        .bind(record.customint1 as i64)
        .bind(record.customint2 as i64)
        .bind(record.customint3 as i64)
        .bind(&record.customtext1)
        .bind(&record.customtext2)
        .bind(&record.customtext3)
        .bind(record.time_modified)
        .bind(record.id)
        .bind(record.course_id)
        .bind(&self.plugin_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
