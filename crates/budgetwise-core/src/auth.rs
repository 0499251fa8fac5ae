//! User registry: signup, login and profile lookup
//!
//! Users live behind [`UserRepository`] so the server can run on the SQLite
//! store or a plain in-memory map. Passwords are stored as argon2 PHC strings.
//! The bearer token handed out on signup/login is the user id.

use std::collections::HashMap;
use std::sync::RwLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Timelike, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{AuthSession, PublicUser, User};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Storage for registered users
pub trait UserRepository: Send + Sync {
    /// Store a new user. Fails with `Conflict` if the email is taken.
    fn insert(&self, user: User) -> Result<()>;

    fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    fn find_by_id(&self, id: &str) -> Result<Option<User>>;
}

/// Users kept in process memory (lost on restart)
#[derive(Default)]
pub struct InMemoryUsers {
    by_email: RwLock<HashMap<String, User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Auth("user registry lock poisoned".into())
}

impl UserRepository for InMemoryUsers {
    fn insert(&self, user: User) -> Result<()> {
        let mut users = self.by_email.write().map_err(poisoned)?;
        if users.contains_key(&user.email) {
            return Err(Error::Conflict("User already exists".into()));
        }
        users.insert(user.email.clone(), user);
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.by_email.read().map_err(poisoned)?;
        Ok(users.get(email).cloned())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let users = self.by_email.read().map_err(poisoned)?;
        Ok(users.values().find(|u| u.id == id).cloned())
    }
}

impl UserRepository for Database {
    fn insert(&self, user: User) -> Result<()> {
        self.insert_user(&user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email(email)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.get_user(id)
    }
}

/// `user_<unix millis>_<9 hex chars>`
fn generate_user_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("user_{}_{}", millis, &suffix[..9])
}

/// Hash a password into an argon2 PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            debug!("Unparseable password hash: {}", e);
            false
        }
    }
}

fn required(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Register a new user
///
/// Missing fields, a short password, and a taken email are all `InvalidData`
/// (the API reports them as 400).
pub fn signup(
    users: &dyn UserRepository,
    name: &str,
    email: &str,
    password: &str,
) -> Result<AuthSession> {
    let (Some(name), Some(email)) = (required(name), required(email)) else {
        return Err(Error::InvalidData("All fields are required".into()));
    };
    if password.is_empty() {
        return Err(Error::InvalidData("All fields are required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidData(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if users.find_by_email(email)?.is_some() {
        return Err(Error::InvalidData("User already exists".into()));
    }

    let now = Utc::now();
    let user = User {
        id: generate_user_id(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password)?,
        // Whole seconds so the SQLite store round-trips the value exactly
        created_at: now.with_nanosecond(0).unwrap_or(now),
    };

    users.insert(user.clone()).map_err(|e| match e {
        Error::Conflict(msg) => Error::InvalidData(msg),
        other => other,
    })?;

    info!("Registered user {}", user.id);
    Ok(AuthSession {
        token: user.id.clone(),
        user: PublicUser::from(&user),
    })
}

/// Authenticate by email and password
pub fn login(users: &dyn UserRepository, email: &str, password: &str) -> Result<AuthSession> {
    let Some(email) = required(email) else {
        return Err(Error::InvalidData("Email and password are required".into()));
    };
    if password.is_empty() {
        return Err(Error::InvalidData("Email and password are required".into()));
    }

    let user = users
        .find_by_email(email)?
        .filter(|u| verify_password(password, &u.password_hash))
        .ok_or_else(|| Error::Auth("Invalid email or password".into()))?;

    debug!("User {} logged in", user.id);
    Ok(AuthSession {
        token: user.id.clone(),
        user: PublicUser::from(&user),
    })
}

/// Resolve a bearer token to its user
///
/// A missing token is `Auth`; a token naming nobody is `NotFound`.
pub fn profile(users: &dyn UserRepository, token: Option<&str>) -> Result<PublicUser> {
    let token = token
        .and_then(required)
        .ok_or_else(|| Error::Auth("Unauthorized".into()))?;

    users
        .find_by_id(token)?
        .map(|u| PublicUser::from(&u))
        .ok_or_else(|| Error::NotFound("User not found".into()))
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
