// service/notification_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, notificationdb::NotificationExt},
    models::notificationmodel::{Notification, NotificationType},
    service::error::ServiceError,
};

pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 20;
const MAX_NOTIFICATION_LIMIT: i64 = 100;

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT)
}

fn ensure_owner(notification: &Notification, user_id: Uuid) -> Result<(), ServiceError> {
    if notification.user_id != user_id {
        return Err(ServiceError::forbidden());
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    /// Inserts a notification. Failures are logged, never returned; the
    /// ticket mutation that triggered it has already happened.
    pub async fn notify(
        &self,
        user_id: Uuid,
        ticket_id: Option<Uuid>,
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
    ) {
        let result = self
            .db_client
            .create_notification(
                user_id,
                ticket_id,
                title.into(),
                message.into(),
                notification_type,
            )
            .await;

        if let Err(e) = result {
            tracing::warn!(
                "failed to create {:?} notification for user {}: {}",
                notification_type,
                user_id,
                e
            );
        }
    }

    pub async fn notify_many(
        &self,
        user_ids: &[Uuid],
        ticket_id: Option<Uuid>,
        title: &str,
        message: &str,
        notification_type: NotificationType,
    ) {
        for user_id in user_ids {
            self.notify(*user_id, ticket_id, title, message, notification_type)
                .await;
        }
    }

    pub async fn list(&self, user_id: Uuid, limit: Option<i64>) -> Result<Vec<Notification>, ServiceError> {
        let notifications = self
            .db_client
            .get_user_notifications(user_id, clamp_limit(limit))
            .await?;
        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        Ok(self.db_client.count_unread_notifications(user_id).await?)
    }

    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<Notification, ServiceError> {
        let notification = self
            .db_client
            .get_notification(notification_id)
            .await?
            .ok_or(ServiceError::NotificationNotFound(notification_id))?;
        ensure_owner(&notification, user_id)?;

        Ok(self.db_client.mark_notification_read(notification_id).await?)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Ok(self.db_client.mark_all_notifications_read(user_id).await?)
    }

    pub async fn delete(&self, notification_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let notification = self
            .db_client
            .get_notification(notification_id)
            .await?
            .ok_or(ServiceError::NotificationNotFound(notification_id))?;
        ensure_owner(&notification, user_id)?;

        self.db_client.delete_notification(notification_id).await?;
        Ok(())
    }
}
