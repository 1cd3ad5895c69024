use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{normalize_email, User, UserRole};

/// Partial update applied by admin and superadmin user management.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error>;

    async fn get_users(&self) -> Result<Vec<User>, Error>;

    async fn get_users_by_role(
        &self,
        role: UserRole,
        active_only: bool,
    ) -> Result<Vec<User>, Error>;

    async fn get_admin_ids(&self) -> Result<Vec<Uuid>, Error>;

    async fn save_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        password: T,
        role: UserRole,
    ) -> Result<User, Error>;

    async fn update_user(&self, user_id: Uuid, changes: UserChanges) -> Result<User, Error>;

    async fn get_user_count(&self) -> Result<i64, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE LOWER(email) = $1"#)
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn get_users(&self) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(r#"SELECT * FROM users ORDER BY created_at DESC"#)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn get_users_by_role(
        &self,
        role: UserRole,
        active_only: bool,
    ) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE role = $1 AND ($2 = FALSE OR is_active = TRUE)
            ORDER BY name ASC
            "#,
        )
        .bind(role)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_admin_ids(&self) -> Result<Vec<Uuid>, Error> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM users
            WHERE role IN ('admin', 'superadmin') AND is_active = TRUE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn save_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        password: T,
        role: UserRole,
    ) -> Result<User, Error> {
        let email: String = email.into();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name.into())
        .bind(normalize_email(&email))
        .bind(password.into())
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, user_id: Uuid, changes: UserChanges) -> Result<User, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(changes.name)
        .bind(changes.email.as_deref().map(normalize_email))
        .bind(changes.role)
        .bind(changes.is_active)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_count(&self) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM users"#)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
