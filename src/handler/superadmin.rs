use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        ticketdtos::{CreateSlaDto, UpdateSlaDto},
        userdtos::{CreateUserDto, FilterUserDto, UpdateUserDto},
    },
    error::HttpError,
    middleware::{require, JWTAuthMiddeware},
    service::policy::Action,
    AppState,
};

pub fn superadmin_handler() -> Router {
    let stats_routes = Router::new()
        .route("/stats", get(get_system_stats))
        .route("/health", get(get_system_health))
        .layer(middleware::from_fn(|state, req, next| {
            require(state, req, next, Action::ViewSystemStats)
        }));

    let sla_routes = Router::new()
        .route("/slas", get(get_slas).post(create_sla))
        .route("/slas/:id", put(update_sla).delete(delete_sla))
        .layer(middleware::from_fn(|state, req, next| {
            require(state, req, next, Action::ManageSlas)
        }));

    let user_routes = Router::new()
        .route("/users", get(get_users).post(create_user))
        .route("/users/:id", put(update_user).delete(deactivate_user))
        .layer(middleware::from_fn(|state, req, next| {
            require(state, req, next, Action::ManagePrivilegedUsers)
        }));

    stats_routes.merge(sla_routes).merge(user_routes)
}

pub async fn get_system_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.stats_service.system_stats(&user.user).await?;
    Ok(Json(stats))
}

pub async fn get_system_health(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let health = app_state.stats_service.system_health(&user.user).await?;
    Ok(Json(health))
}

pub async fn get_slas(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let slas = app_state.sla_service.list(&user.user).await?;

    Ok(Json(json!({
        "status": "success",
        "slas": slas,
    })))
}

pub async fn create_sla(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateSlaDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let sla = app_state
        .sla_service
        .create(
            &user.user,
            body.name,
            body.priority,
            body.response_time,
            body.resolution_time,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "SLA created successfully",
            "sla": sla,
        })),
    ))
}

pub async fn update_sla(
    Path(sla_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateSlaDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let sla = app_state
        .sla_service
        .update(&user.user, sla_id, body.into())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "SLA updated successfully",
        "sla": sla,
    })))
}

pub async fn delete_sla(
    Path(sla_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.sla_service.delete(&user.user, sla_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "SLA deleted successfully",
    })))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.user_service.list_users(&user.user).await?;

    Ok(Json(json!({
        "status": "success",
        "users": FilterUserDto::filter_users(&users),
        "results": users.len(),
    })))
}

pub async fn create_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let created = app_state
        .user_service
        .create_user(&user.user, body.name, body.email, body.password, body.role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "User created successfully",
            "user": FilterUserDto::filter_user(&created),
        })),
    ))
}

pub async fn update_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let updated = app_state
        .user_service
        .update_user(&user.user, user_id, body.into())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "User updated successfully",
        "user": FilterUserDto::filter_user(&updated),
    })))
}

pub async fn deactivate_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let deactivated = app_state
        .user_service
        .deactivate_user(&user.user, user_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "User deactivated successfully",
        "user": FilterUserDto::filter_user(&deactivated),
    })))
}
