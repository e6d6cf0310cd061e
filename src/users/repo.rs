use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::dto::RegisterPayload;

/// Postgres SQLSTATE for a uniqueness violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user already exists")]
    AlreadyExists,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_male: bool,
    pub age: i32,
    pub height: i32,
    pub weight: i32,
    pub goal: String,
    pub weight_goal: i32,
    pub activation_code: String,
}

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at, is_active, \
     is_superuser, is_male, age, height, weight, goal, weight_goal, activation_code";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        user.ok_or(StoreError::NotFound)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        user.ok_or(StoreError::NotFound)
    }

    pub async fn find_by_activation_code(db: &PgPool, code: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE activation_code = $1"
        ))
        .bind(code)
        .fetch_optional(db)
        .await?;
        user.ok_or(StoreError::NotFound)
    }

    /// Insert a new row with a fresh activation code. A duplicate email
    /// surfaces as `AlreadyExists`; anything else is opaque.
    pub async fn create(
        db: &PgPool,
        payload: &RegisterPayload,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let activation_code = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, username, password_hash, is_male, age, height, weight, \
             goal, weight_goal, activation_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&payload.email)
        .bind(&payload.username)
        .bind(password_hash)
        .bind(payload.is_male)
        .bind(payload.age)
        .bind(payload.height)
        .bind(payload.weight)
        .bind(&payload.goal)
        .bind(payload.weight_goal)
        .bind(&activation_code)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::AlreadyExists
            }
            _ => StoreError::Database(e),
        })?;

        Ok(user)
    }

    /// Full-row update of the mutable profile fields plus the active flag.
    pub async fn update(&self, db: &PgPool) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET email = $1, username = $2, is_male = $3, age = $4, height = $5, \
             weight = $6, goal = $7, weight_goal = $8, is_active = $9 WHERE id = $10",
        )
        .bind(&self.email)
        .bind(&self.username)
        .bind(self.is_male)
        .bind(self.age)
        .bind(self.height)
        .bind(self.weight)
        .bind(&self.goal)
        .bind(self.weight_goal)
        .bind(self.is_active)
        .bind(self.id)
        .execute(db)
        .await?;
        Ok(())
    }
}
