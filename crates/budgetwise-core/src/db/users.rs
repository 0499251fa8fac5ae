//! User operations

use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Insert a user. A duplicate email is a `Conflict`.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        let created_at = user.created_at.format("%Y-%m-%d %H:%M:%S").to_string();

        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
            params![user.id, user.name, user.email, user.password_hash, created_at],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Error::Conflict("User already exists".into())
            }
            other => Error::Database(other),
        })?;

        Ok(())
    }

    /// Look a user up by email (exact match)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?",
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}
