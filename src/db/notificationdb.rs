use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::notificationmodel::{Notification, NotificationType};

#[async_trait]
pub trait NotificationExt {
    async fn create_notification(
        &self,
        user_id: Uuid,
        ticket_id: Option<Uuid>,
        title: String,
        message: String,
        notification_type: NotificationType,
    ) -> Result<Notification, Error>;

    async fn get_user_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, Error>;

    async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>, Error>;

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, Error>;

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification, Error>;

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, Error>;

    async fn delete_notification(&self, notification_id: Uuid) -> Result<u64, Error>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn create_notification(
        &self,
        user_id: Uuid,
        ticket_id: Option<Uuid>,
        title: String,
        message: String,
        notification_type: NotificationType,
    ) -> Result<Notification, Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, ticket_id, title, message, notification_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(ticket_id)
        .bind(title)
        .bind(message)
        .bind(notification_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_user_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>, Error> {
        let notification =
            sqlx::query_as::<_, Notification>(r#"SELECT * FROM notifications WHERE id = $1"#)
                .bind(notification_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(notification)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification, Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(notification_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, notification_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(r#"DELETE FROM notifications WHERE id = $1"#)
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
