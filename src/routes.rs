// routes.rs
use std::{any::Any, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handler::{
        admin::admin_handler, auth::auth_handler, manager::manager_handler,
        notifications::notifications_handler, superadmin::superadmin_handler,
        tickets::tickets_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Helpdesk API is running"
    }))
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>, development: bool) -> Response {
    let detail = panic_message(err.as_ref());
    tracing::error!("handler panicked: {}", detail);

    let message = if development {
        detail
    } else {
        "Internal server error".to_string()
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "message": message,
        })),
    )
        .into_response()
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let development = app_state.env.is_development();

    let tickets_routes = tickets_handler()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(app_state.env.max_upload_bytes))
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_handler())
        .nest("/tickets", tickets_routes)
        .nest("/admin", admin_handler().layer(middleware::from_fn(auth)))
        .nest("/manager", manager_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/superadmin",
            superadmin_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/notifications",
            notifications_handler().layer(middleware::from_fn(auth)),
        );

    Router::new()
        .nest("/api", api_route)
        .nest_service("/uploads", ServeDir::new(app_state.storage.root()))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
            panic_response(err, development)
        }))
        .layer(Extension(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::{config::test_config, AppState};

    fn test_router() -> Router {
        let config = test_config();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        create_router(Arc::new(AppState::new(crate::db::db::DBClient::new(pool), config)))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_router()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        for uri in [
            "/api/tickets",
            "/api/admin/stats",
            "/api/manager/summary",
            "/api/superadmin/health",
            "/api/notifications",
            "/api/auth/me",
        ] {
            let response = test_router()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            let body = body_json(response).await;
            assert_eq!(body["status"], "fail");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let response = test_router()
            .oneshot(
                Request::get("/api/tickets")
                    .header("Authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_lookup_failure_is_a_server_error() {
        let mut config = test_config();
        config.database_url = "postgres://helpdesk@127.0.0.1:1/helpdesk".to_string();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(300))
            .connect_lazy(&config.database_url)
            .unwrap();
        let token = crate::utils::token::create_token(
            &uuid::Uuid::new_v4().to_string(),
            config.jwt_secret.as_bytes(),
            config.jwt_maxage,
        )
        .unwrap();
        let router = create_router(Arc::new(AppState::new(crate::db::db::DBClient::new(pool), config)));

        let response = router
            .oneshot(
                Request::get("/api/auth/me")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn panic_detail_only_in_development() {
        let hidden = panic_response(Box::new("boom"), false);
        assert_eq!(hidden.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("kaboom")), "kaboom");
    }
}
