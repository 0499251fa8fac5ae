//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `expenses` - Expense CRUD and period summaries
//! - `users` - Registered users (backs the SQLite `UserRepository`)
//! - `audit` - API access log

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod audit;
mod expenses;
mod users;

pub use audit::AuditEntry;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "BW_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// The salt is fixed so a passphrase keeps opening the same file after it is
/// moved or restored.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this invalidates every existing encrypted database
    const APP_SALT: &[u8; 16] = b"budgetwise-kdf01";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let output = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(output.as_bytes()))
}

/// Parse a SQLite `CURRENT_TIMESTAMP` string
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format a timestamp for storage
///
/// Millisecond RFC 3339 in UTC, so string comparison and `substr(.., 1, 10)`
/// both follow calendar order.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp written by `format_timestamp`
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| parse_datetime(s))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    db_path: String,
    // Removed once the last clone of a throwaway database drops
    temp_dir: Option<Arc<tempfile::TempDir>>,
}

impl Database {
    /// Open an encrypted database
    ///
    /// Requires `BW_DB_KEY`. The SQLCipher key is derived from the passphrase
    /// with Argon2. Use `new_unencrypted()` for development databases.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases.",
                DB_KEY_ENV
            ))),
        }
    }

    /// Open an unencrypted database (development and tests only)
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Open a database with an explicit passphrase
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Every pooled connection has to unlock the file itself
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
            temp_dir: None,
        };
        db.run_migrations()?;

        Ok(db)
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Backed by a file in a private temp directory rather than `:memory:`,
    /// since every pooled connection would otherwise see its own empty
    /// database. The directory goes away with the last clone.
    pub fn in_memory() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("budgetwise_test_").tempdir()?;
        let path = dir.path().join("budget.db");

        let mut db = Self::new_unencrypted(&path.to_string_lossy())?;
        db.temp_dir = Some(Arc::new(dir));
        Ok(db)
    }

    /// Directory holding a throwaway database, if this is one
    pub fn temp_dir(&self) -> Option<&std::path::Path> {
        self.temp_dir.as_deref().map(tempfile::TempDir::path)
    }

    /// Check whether SQLCipher is active and a key was configured
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- WAL: readers don't block writers (creates -wal/-shm sidecars)
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                occurred_at TEXT NOT NULL,                 -- RFC 3339, UTC, millisecond precision
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_occurred_at ON expenses(occurred_at);
            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);

            -- Users (email is the login key)
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,              -- argon2 PHC string
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Audit log (tracks API access)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                user_id TEXT NOT NULL,
                action TEXT NOT NULL,
                entity_type TEXT,
                entity_id INTEGER,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_audit_log_user ON audit_log(user_id);
            CREATE INDEX IF NOT EXISTS idx_audit_log_timestamp ON audit_log(timestamp);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
