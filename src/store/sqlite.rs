use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{
    Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter,
};

use super::schema::SCHEMA;
use super::{ActivityLog, Store, UserDeletion};
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str =
    "id, name, email, role, is_verified, status, password, created_at, updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn map_unique_violation(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::AlreadyExists
        }
        e => Error::from(e),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let role = Role::parse(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown role '{role}'").into(),
        )
    })?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role,
        is_verified: row.get(4)?,
        status: row.get(5)?,
        password: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn query_user(conn: &Connection, filter: &str, value: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE {filter} = ?1"),
        params![value],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_notebook(conn: &Connection, id: &str) -> Result<Option<Notebook>> {
    let document: Option<String> = conn
        .query_row(
            "SELECT document FROM notebooks WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    document
        .map(|doc| serde_json::from_str(&doc).map_err(Error::from))
        .transpose()
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, role, is_verified, status, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.role.as_str(),
                    user.is_verified,
                    user.status,
                    user.password,
                    format_datetime(&user.created_at),
                    format_datetime(&user.updated_at),
                ],
            )
            .map_err(map_unique_violation)?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        query_user(&self.conn(), "id", id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        query_user(&self.conn(), "email", email)
    }

    fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let mut assignments = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(name) = &update.name {
            assignments.push("name = ?");
            values.push(SqlValue::Text(name.clone()));
        }
        if let Some(email) = &update.email {
            assignments.push("email = ?");
            values.push(SqlValue::Text(email.clone()));
        }
        if let Some(role) = update.role {
            assignments.push("role = ?");
            values.push(SqlValue::Text(role.as_str().to_string()));
        }
        if let Some(is_verified) = update.is_verified {
            assignments.push("is_verified = ?");
            values.push(SqlValue::Integer(i64::from(is_verified)));
        }
        if let Some(status) = &update.status {
            assignments.push("status = ?");
            values.push(SqlValue::Text(status.clone()));
        }
        assignments.push("updated_at = ?");
        values.push(SqlValue::Text(format_datetime(&updated_at)));
        values.push(SqlValue::Text(id.to_string()));

        let conn = self.conn();
        let rows = conn
            .execute(
                &format!("UPDATE users SET {} WHERE id = ?", assignments.join(", ")),
                params_from_iter(values),
            )
            .map_err(map_unique_violation)?;

        if rows == 0 {
            return Ok(None);
        }
        query_user(&conn, "id", id)
    }

    fn count_admins(&self) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn delete_user_guarded(&self, id: &str) -> Result<UserDeletion> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let role: Option<String> = tx
            .query_row("SELECT role FROM users WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(role) = role else {
            return Ok(UserDeletion::NotFound);
        };

        if role == Role::Admin.as_str() {
            let admins: i64 = tx.query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )?;
            if admins <= 1 {
                return Ok(UserDeletion::LastAdmin);
            }
        }

        let rows = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        tx.commit()?;

        Ok(if rows > 0 {
            UserDeletion::Deleted
        } else {
            UserDeletion::NotFound
        })
    }

    // Notebook operations

    fn create_notebook(&self, notebook: &Notebook) -> Result<()> {
        let document = serde_json::to_string(notebook)?;
        self.conn()
            .execute(
                "INSERT INTO notebooks (id, user_id, document, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    notebook.notebook_id,
                    notebook.user_id,
                    document,
                    format_datetime(&notebook.created_at),
                ],
            )
            .map_err(map_unique_violation)?;
        Ok(())
    }

    fn get_notebook(&self, id: &str) -> Result<Option<Notebook>> {
        query_notebook(&self.conn(), id)
    }

    fn increment_notebook_views(&self, id: &str) -> Result<Option<Notebook>> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut notebook) = query_notebook(&tx, id)? else {
            return Ok(None);
        };
        notebook.stats.views += 1;

        tx.execute(
            "UPDATE notebooks SET document = ?1 WHERE id = ?2",
            params![serde_json::to_string(&notebook)?, id],
        )?;
        tx.commit()?;

        Ok(Some(notebook))
    }

    fn update_notebook(&self, notebook: &Notebook) -> Result<Option<Notebook>> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(stored) = query_notebook(&tx, &notebook.notebook_id)? else {
            return Ok(None);
        };
        let mut saved = notebook.clone();
        saved.stats = stored.stats;

        tx.execute(
            "UPDATE notebooks SET user_id = ?1, document = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                saved.user_id,
                serde_json::to_string(&saved)?,
                format_datetime(&Utc::now()),
                saved.notebook_id,
            ],
        )?;
        tx.commit()?;

        Ok(Some(saved))
    }

    fn delete_notebook_owned(&self, id: &str, owner_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM notebooks WHERE id = ?1 AND user_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows > 0)
    }
}

impl ActivityLog for SqliteStore {
    fn record_activity(&self, activity: &Activity) -> Result<()> {
        self.conn().execute(
            "INSERT INTO activities (id, user_id, notebook_id, action, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                activity.id,
                activity.user_id,
                activity.notebook_id,
                activity.action,
                serde_json::to_string(&activity.details)?,
                format_datetime(&activity.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_notebook_activities(&self, notebook_id: &str) -> Result<Vec<Activity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, notebook_id, action, details, created_at
             FROM activities WHERE notebook_id = ?1 ORDER BY created_at, rowid",
        )?;

        let rows = stmt.query_map(params![notebook_id], |row| {
            Ok((
                Activity {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    notebook_id: row.get(2)?,
                    action: row.get(3)?,
                    details: serde_json::Value::Null,
                    created_at: parse_datetime(&row.get::<_, String>(5)?),
                },
                row.get::<_, String>(4)?,
            ))
        })?;

        rows.map(|row| -> Result<Activity> {
            let (mut activity, details) = row?;
            activity.details = serde_json::from_str(&details)?;
            Ok(activity)
        })
        .collect()
    }
}
