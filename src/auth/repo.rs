use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. The password hash and the reset-token pair
/// never leave the server in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub birthdate: String,
    pub profile_picture: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub birthdate: &'a str,
    pub profile_picture: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub mobile_number: &'a str,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, birthdate, \
     profile_picture, first_name, last_name, mobile_number, reset_token, \
     reset_token_expiry, created_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user with an already-hashed password.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (username, email, password_hash, role, birthdate, profile_picture,
                 first_name, last_name, mobile_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.birthdate)
        .bind(new.profile_picture)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.mobile_number)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Overwrite every profile field. Returns the number of rows matched.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        first_name: &str,
        last_name: &str,
        email: &str,
        mobile_number: &str,
        birthdate: &str,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $1, last_name = $2, email = $3, mobile_number = $4, birthdate = $5
            WHERE id = $6
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(mobile_number)
        .bind(birthdate)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_profile_picture(
        db: &PgPool,
        id: Uuid,
        profile_picture: &str,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE users SET profile_picture = $1 WHERE id = $2")
            .bind(profile_picture)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Persist a freshly issued reset token next to the user row.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reset_token = $1, reset_token_expiry = $2 WHERE id = $3")
            .bind(token)
            .bind(expiry)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Look up the user a reset token belongs to. The stored token must match
    /// exactly and the stored expiry must still be in the future; the JWT's
    /// own expiry is checked separately by the caller.
    pub async fn find_by_reset_token(
        db: &PgPool,
        email: &str,
        token: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE email = $1 AND reset_token = $2 AND reset_token_expiry > now()
            "#
        ))
        .bind(email)
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Set the new password and consume the reset token in one statement.
    pub async fn reset_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, reset_token = NULL, reset_token_expiry = NULL
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }
}

/// Latest known client version, if any has been published.
pub async fn latest_app_version(db: &PgPool) -> anyhow::Result<Option<String>> {
    let version = sqlx::query_scalar::<_, String>(
        "SELECT version FROM app_version ORDER BY released_at DESC LIMIT 1",
    )
    .fetch_optional(db)
    .await?;
    Ok(version)
}
