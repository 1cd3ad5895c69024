use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::ticketdtos::{
        AssignTicketDto, CreateCommentDto, CreateTicketDto, UpdateStatusDto, UpdateTicketDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::ticketmodel::TicketQueryParams,
    service::ticket_service::{NewTicketInput, TicketChanges},
    AppState,
};

pub fn tickets_handler() -> Router {
    Router::new()
        .route("/", get(get_tickets).post(create_ticket))
        .route(
            "/:id",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/:id/status", post(update_ticket_status))
        .route("/:id/assign", post(assign_ticket))
        .route("/:id/comments", post(add_comment))
        .route("/:id/attachments", post(upload_attachment))
}

pub async fn get_tickets(
    Query(params): Query<TicketQueryParams>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let tickets = app_state
        .ticket_service
        .list(&user.user, &params)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "tickets": tickets,
        "results": tickets.len(),
    })))
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket = app_state
        .ticket_service
        .create(
            &user.user,
            NewTicketInput {
                title: body.title,
                description: body.description,
                priority: body.priority,
                category: body.category,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Ticket created successfully",
            "ticket": ticket,
        })),
    ))
}

pub async fn get_ticket(
    Path(ticket_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state.ticket_service.get(&user.user, ticket_id).await?;

    Ok(Json(json!({
        "status": "success",
        "ticket": ticket,
    })))
}

pub async fn update_ticket(
    Path(ticket_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let changes = TicketChanges {
        title: body.title,
        description: body.description,
        category: body.category,
        priority: body.priority,
        status: body.status,
        due_date: body.due_date,
    };

    let ticket = app_state
        .ticket_service
        .update(&user.user, ticket_id, changes)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Ticket updated successfully",
        "ticket": ticket,
    })))
}

pub async fn delete_ticket(
    Path(ticket_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.ticket_service.delete(&user.user, ticket_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Ticket deleted successfully",
    })))
}

pub async fn update_ticket_status(
    Path(ticket_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .update_status(&user.user, ticket_id, body.status)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Ticket status updated successfully",
        "ticket": ticket,
    })))
}

pub async fn assign_ticket(
    Path(ticket_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<AssignTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .assign(&user.user, ticket_id, body.agent_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Ticket assigned successfully",
        "ticket": ticket,
    })))
}

pub async fn add_comment(
    Path(ticket_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let comment = app_state
        .ticket_service
        .add_comment(&user.user, ticket_id, body.content, body.is_internal)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Comment added successfully",
            "comment": comment,
        })),
    ))
}

pub async fn upload_attachment(
    Path(ticket_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(e.to_string()))?;

        let attachment = app_state
            .ticket_service
            .add_attachment(&user.user, ticket_id, original_name, mime_type, &bytes)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "status": "success",
                "message": "File uploaded successfully",
                "attachment": attachment,
            })),
        ));
    }

    Err(HttpError::bad_request("No file uploaded"))
}
