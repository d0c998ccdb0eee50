/// User model and database operations
///
/// A user owns tasks and carries the contact details reminders are sent to:
/// the login email, an optional Telegram chat ID and an optional phone number.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id VARCHAR(64) PRIMARY KEY,
///     email VARCHAR(320) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     telegram_chat_id VARCHAR(64),
///     phone_number VARCHAR(32),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `User` is deliberately not `Serialize`: anything leaving the process goes
/// through [`UserProfile`], which has no password hash.
///
/// # Example
///
/// ```no_run
/// use taskminder_shared::models::user::{User, CreateUser};
/// use taskminder_shared::auth::password::hash_password;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&pool, CreateUser {
///     email: "alice@x.io".to_string(),
///     password_hash: hash_password("pw1")?,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "alice@x.io").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::deserialize_present;

/// Registered account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Opaque string ID (a v4 UUID in canonical form)
    pub id: String,

    /// Login email, unique across users
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub is_active: bool,

    /// Telegram chat that receives reminders
    pub telegram_chat_id: Option<String>,

    /// Phone number that receives SMS reminders
    pub phone_number: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
}

/// Contact field changes
///
/// Absent fields are untouched; `null` clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContacts {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub telegram_chat_id: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub phone_number: Option<Option<String>>,
}

impl UpdateContacts {
    pub fn is_empty(&self) -> bool {
        self.telegram_chat_id.is_none() && self.phone_number.is_none()
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            telegram_chat_id: user.telegram_chat_id,
            phone_number: user.phone_number,
        }
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile::from(user.clone())
    }
}

impl User {
    /// Creates a user with a freshly generated ID
    ///
    /// # Errors
    ///
    /// A duplicate email surfaces as a database error on the `users_email_key`
    /// unique constraint.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, is_active, telegram_chat_id,
                      phone_number, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_active, telegram_chat_id,
                   phone_number, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by exact email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_active, telegram_chat_id,
                   phone_number, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Loads every user in `ids` in one round trip
    ///
    /// Unknown IDs are silently absent from the result.
    pub async fn find_many_by_ids(pool: &PgPool, ids: &[String]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_active, telegram_chat_id,
                   phone_number, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Links a Telegram chat to the user with `id`
    ///
    /// Returns the updated user, or `None` if the user does not exist.
    pub async fn attach_telegram_chat_id(
        pool: &PgPool,
        id: &str,
        chat_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET telegram_chat_id = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, is_active, telegram_chat_id,
                      phone_number, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Applies contact changes and returns the updated user
    pub async fn update_contacts(
        pool: &PgPool,
        id: &str,
        data: UpdateContacts,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

        if let Some(telegram_chat_id) = data.telegram_chat_id {
            query.push(", telegram_chat_id = ").push_bind(telegram_chat_id);
        }

        if let Some(phone_number) = data.phone_number {
            query.push(", phone_number = ").push_bind(phone_number);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(
            " RETURNING id, email, password_hash, is_active, telegram_chat_id, \
             phone_number, created_at, updated_at",
        );

        let user = query.build_query_as::<User>().fetch_optional(pool).await?;

        Ok(user)
    }
}
