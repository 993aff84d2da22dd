// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{NewUser, UpdateUserPayload, User},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn create_user(&self, new: &NewUser) -> Result<User, AppError>;
    /// Campos `None` ficam como estão. `NotFound` se o id não existe.
    async fn update_user(&self, id: Uuid, changes: &UpdateUserPayload) -> Result<User, AppError>;
    async fn delete_user(&self, id: Uuid) -> Result<(), AppError>;
    async fn count_users(&self) -> Result<i64, AppError>;
}

const USER_COLUMNS: &str =
    "id, full_name, cpf, email, whatsapp, role, password_hash, created_at, updated_at";

// E-mail é a única chave única além do id
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return AppError::EmailAlreadyExists;
        }
    }
    e.into()
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY full_name");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    // O e-mail é gravado em minúsculas, então a busca também
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    async fn create_user(&self, new: &NewUser) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (full_name, cpf, email, whatsapp, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new.full_name)
            .bind(&new.cpf)
            .bind(new.email.trim().to_lowercase())
            .bind(&new.whatsapp)
            .bind(new.role)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: &UpdateUserPayload) -> Result<User, AppError> {
        let sql = format!(
            r#"
            UPDATE users SET
                full_name  = COALESCE($2, full_name),
                cpf        = COALESCE($3, cpf),
                email      = COALESCE($4, email),
                whatsapp   = COALESCE($5, whatsapp),
                role       = COALESCE($6, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&changes.full_name)
            .bind(&changes.cpf)
            .bind(changes.email.as_ref().map(|e| e.trim().to_lowercase()))
            .bind(&changes.whatsapp)
            .bind(changes.role)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)?
            .ok_or(AppError::NotFound)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
