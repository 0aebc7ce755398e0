use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserName;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::AccountError;

const USER_COLUMNS: &str = r#"
    id, name, email, password_digest, remember_digest, activation_digest,
    activated, activated_at, reset_digest, reset_sent_at, role, created_at
"#;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<User, AccountError> {
        let role = Role::from_code(row.get("role"))
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(User {
            id: UserId(row.get("id")),
            name: UserName::from_stored(row.get("name")),
            email: EmailAddress::from_stored(row.get("email")),
            password_digest: row.get("password_digest"),
            remember_digest: row.get("remember_digest"),
            activation_digest: row.get("activation_digest"),
            activated: row.get("activated"),
            activated_at: row.get("activated_at"),
            reset_digest: row.get("reset_digest"),
            reset_sent_at: row.get("reset_sent_at"),
            role,
            created_at: row.get("created_at"),
        })
    }

    fn map_write_error(e: sqlx::Error, user: &User) -> AccountError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                return AccountError::EmailAlreadyExists(user.email.as_str().to_string());
            }
        }
        AccountError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_digest, remember_digest, activation_digest,
                activated, activated_at, reset_digest, reset_sent_at, role, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.password_digest.as_deref())
        .bind(user.remember_digest.as_deref())
        .bind(user.activation_digest.as_deref())
        .bind(user.activated)
        .bind(user.activated_at)
        .bind(user.reset_digest.as_deref())
        .bind(user.reset_sent_at)
        .bind(user.role.code())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn update(&self, user: User) -> Result<User, AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_digest = $4, remember_digest = $5,
                activation_digest = $6, activated = $7, activated_at = $8,
                reset_digest = $9, reset_sent_at = $10, role = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.password_digest.as_deref())
        .bind(user.remember_digest.as_deref())
        .bind(user.activation_digest.as_deref())
        .bind(user.activated)
        .bind(user.activated_at)
        .bind(user.reset_digest.as_deref())
        .bind(user.reset_sent_at)
        .bind(user.role.code())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<(), AccountError> {
        let db_error = |e: sqlx::Error| AccountError::DatabaseError(e.to_string());

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("UPDATE borrow_requests SET user_id = NULL, updated_at = now() WHERE user_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for table in ["comments", "bookmarks", "follow_authors"] {
            sqlx::query(&format!("DELETE FROM {} WHERE user_id = $1", table))
                .bind(id.0)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the dependent writes.
            return Err(AccountError::NotFound(id.to_string()));
        }

        tx.commit().await.map_err(db_error)?;

        Ok(())
    }
}
