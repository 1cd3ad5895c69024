use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::userdtos::{AgentDto, FilterUserDto, UpdateUserDto},
    error::HttpError,
    middleware::{require, JWTAuthMiddeware},
    service::policy::Action,
    AppState,
};

pub fn admin_handler() -> Router {
    let stats_routes = Router::new()
        .route("/stats", get(get_stats))
        .layer(middleware::from_fn(|state, req, next| {
            require(state, req, next, Action::ViewAdminStats)
        }));

    let user_routes = Router::new()
        .route("/users", get(get_users))
        .route("/users/:id", put(update_user))
        .layer(middleware::from_fn(|state, req, next| {
            require(state, req, next, Action::ManageUsers)
        }));

    let agent_routes = Router::new()
        .route("/agents", get(get_agents))
        .layer(middleware::from_fn(|state, req, next| {
            require(state, req, next, Action::AssignTicket)
        }));

    stats_routes.merge(user_routes).merge(agent_routes)
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.stats_service.admin_stats(&user.user).await?;
    Ok(Json(stats))
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

pub async fn get_agents(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let agents = app_state.user_service.list_active_agents(&user.user).await?;

    Ok(Json(json!({
        "status": "success",
        "agents": AgentDto::filter_agents(&agents),
    })))
}
