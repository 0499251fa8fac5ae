//! Audit log operations

use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::error::Result;

/// Audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub user_id: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}

impl Database {
    /// Record an API action
    pub fn log_audit(
        &self,
        user_id: &str,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (user_id, action, entity_type, entity_id, details)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![user_id, action, entity_type, entity_id, details],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent audit entries first
    pub fn list_audit_log(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp, user_id, action, entity_type, entity_id, details
            FROM audit_log
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    user_id: row.get(2)?,
                    action: row.get(3)?,
                    entity_type: row.get(4)?,
                    entity_id: row.get(5)?,
                    details: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
