use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{delete, get, patch},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::notificationmodel::NotificationQueryParams,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new()
        .route("/", get(get_notifications))
        .route("/count/unread", get(get_unread_count))
        .route("/read/all", patch(mark_all_read))
        .route("/:id/read", patch(mark_read))
        .route("/:id", delete(delete_notification))
}

pub async fn get_notifications(
    Query(params): Query<NotificationQueryParams>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state
        .notification_service
        .list(user.user.id, params.limit)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "notifications": notifications,
    })))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let count = app_state
        .notification_service
        .unread_count(user.user.id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "unreadCount": count,
    })))
}

pub async fn mark_read(
    Path(notification_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .notification_service
        .mark_read(notification_id, user.user.id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Notification marked as read",
        "notification": notification,
    })))
}

pub async fn mark_all_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state
        .notification_service
        .mark_all_read(user.user.id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "All notifications marked as read",
        "updated": updated,
    })))
}

pub async fn delete_notification(
    Path(notification_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .notification_service
        .delete(notification_id, user.user.id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Notification deleted",
    })))
}
