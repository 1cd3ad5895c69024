mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::db::DBClient;
use dotenv::dotenv;
use mail::{mails::EmailService, sendmail::Mailer};
use routes::create_router;
use service::{
    notification_service::NotificationService, sla_service::SlaService, stats_service::StatsService,
    ticket_service::TicketService, user_service::UserService,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;
use utils::storage::FileStorage;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub ticket_service: Arc<TicketService>,
    pub notification_service: Arc<NotificationService>,
    pub stats_service: Arc<StatsService>,
    pub sla_service: Arc<SlaService>,
    pub user_service: Arc<UserService>,
    pub storage: FileStorage,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client = Arc::new(db_client);

        let storage = FileStorage::new(&config.upload_dir);
        let email = EmailService::new(Mailer::new(config.smtp.clone()));
        let notification_service = NotificationService::new(db_client.clone());
        let ticket_service = TicketService::new(
            db_client.clone(),
            notification_service.clone(),
            email,
            storage.clone(),
        );
        let stats_service = StatsService::new(db_client.clone(), config.health_thresholds);
        let sla_service = SlaService::new(db_client.clone());
        let user_service = UserService::new(db_client.clone());

        Self {
            env: config,
            db_client,
            ticket_service: Arc::new(ticket_service),
            notification_service: Arc::new(notification_service),
            stats_service: Arc::new(stats_service),
            sla_service: Arc::new(sla_service),
            user_service: Arc::new(user_service),
            storage,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("helpdesk=debug,tower_http=debug")),
        )
        .init();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let db_client = match DBClient::connect(&config.database_url, 10).await {
        Ok(db_client) => {
            tracing::info!("connection to the database is successful");
            db_client
        }
        Err(err) => {
            tracing::error!("failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = db_client.run_migrations().await {
        tracing::error!("failed to run migrations: {}", err);
        std::process::exit(1);
    }

    if let Err(err) = service::user_service::seed_defaults(&db_client, &config).await {
        tracing::error!("failed to seed default data: {}", err);
        std::process::exit(1);
    }

    if config.smtp.is_none() {
        tracing::warn!("SMTP credentials not set, outgoing mail will only be logged");
    }

    let app_state = AppState::new(db_client, config.clone());
    if let Err(err) = app_state.storage.ensure_root().await {
        tracing::error!("cannot create upload directory {}: {}", config.upload_dir, err);
        std::process::exit(1);
    }

    let app = create_router(Arc::new(app_state)).layer(cors_layer(&config));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("cannot bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", err);
    }
}
