use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{AlreadyExists, NewUser, RegistrationCode, Repository, RepositoryPtr, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            is_admin: r.is_admin,
            created_at: r.created_at,
        }
    }
}

pub fn create_postgres_repository(pool: PgPool) -> RepositoryPtr {
    // ---
    Arc::new(PostgresRepository::new(pool))
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>> {
        // ---
        // `column` is always a literal from this file, never user input.
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepository {
    // ---
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        // ---
        let user = User::new(new_user);

        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, is_admin, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    _ => "username",
                };
                Err(AlreadyExists { field }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        // ---
        self.fetch_one_by("username", username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        // ---
        self.fetch_one_by("email", email).await
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        // ---
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        // ---
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        // ---
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn store_registration_code(&self, code: &RegistrationCode) -> Result<()> {
        // ---
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM registration_codes")
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO registration_codes (code, expires_at) VALUES ($1, $2)")
            .bind(&code.code)
            .bind(code.expires_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn registration_code_is_live(&self, code: &str, now: DateTime<Utc>) -> Result<bool> {
        // ---
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT code FROM registration_codes WHERE code = $1 AND expires_at > $2",
        )
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn consume_registration_code(&self, code: &str, now: DateTime<Utc>) -> Result<bool> {
        // ---
        let result = sqlx::query("DELETE FROM registration_codes WHERE code = $1 AND expires_at > $2")
            .bind(code)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<()> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
