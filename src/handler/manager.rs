use std::sync::Arc;

use axum::{middleware, response::IntoResponse, routing::get, Extension, Json, Router};
use serde_json::json;

use crate::{
    error::HttpError,
    middleware::{require, JWTAuthMiddeware},
    service::policy::Action,
    AppState,
};

pub fn manager_handler() -> Router {
    Router::new()
        .route("/summary", get(get_team_summary))
        .route("/performance", get(get_team_performance))
        .route("/workload", get(get_team_workload))
        .route("/report/priority", get(get_priority_report))
        .route("/report/status", get(get_status_report))
        .layer(middleware::from_fn(|state, req, next| {
            require(state, req, next, Action::ViewTeamReports)
        }))
}

pub async fn get_team_summary(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let summary = app_state.stats_service.team_summary(&user.user).await?;
    Ok(Json(summary))
}

pub async fn get_team_performance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let performance = app_state.stats_service.agent_performance(&user.user).await?;
    Ok(Json(json!({ "performance": performance })))
}

pub async fn get_team_workload(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let workload = app_state.stats_service.agent_workload(&user.user).await?;
    Ok(Json(json!({ "workload": workload })))
}

pub async fn get_priority_report(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let report = app_state.stats_service.team_priority_report(&user.user).await?;
    Ok(Json(report))
}

pub async fn get_status_report(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let report = app_state.stats_service.team_status_report(&user.user).await?;
    Ok(Json(report))
}
