// dtos/ticketdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        slamodel::Sla,
        ticketmodel::{AttachmentWithUploader, CommentWithAuthor, Ticket, TicketPriority, TicketStatus},
        usermodel::{User, UserRole},
    },
    service::sla_service::SlaChanges,
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub priority: Option<TicketPriority>,

    #[validate(length(max = 100, message = "Category must not be more than 100 characters"))]
    pub category: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    #[validate(length(max = 100, message = "Category must not be more than 100 characters"))]
    pub category: Option<String>,

    pub priority: Option<TicketPriority>,
    pub status: Option<TicketStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusDto {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTicketDto {
    pub agent_id: Uuid,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentDto {
    #[validate(length(min = 1, message = "Comment content is required"))]
    pub content: String,

    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlaDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub priority: TicketPriority,

    #[validate(range(min = 1, message = "Response time must be at least 1 hour"))]
    pub response_time: i32,

    #[validate(range(min = 1, message = "Resolution time must be at least 1 hour"))]
    pub resolution_time: i32,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlaDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    pub priority: Option<TicketPriority>,

    #[validate(range(min = 1, message = "Response time must be at least 1 hour"))]
    pub response_time: Option<i32>,

    #[validate(range(min = 1, message = "Resolution time must be at least 1 hour"))]
    pub resolution_time: Option<i32>,
}

impl From<UpdateSlaDto> for SlaChanges {
    fn from(dto: UpdateSlaDto) -> Self {
        SlaChanges {
            name: dto.name,
            priority: dto.priority,
            response_time: dto.response_time,
            resolution_time: dto.resolution_time,
        }
    }
}

/// Public view of a user attached to ticket payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummaryDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl UserSummaryDto {
    pub fn from_user(user: &User) -> Self {
        UserSummaryDto {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetailDto {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub creator: Option<UserSummaryDto>,
    pub assigned_to: Option<UserSummaryDto>,
    pub sla: Option<Sla>,
    pub comments: Vec<CommentWithAuthor>,
    pub attachments: Vec<AttachmentWithUploader>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_defaults_to_public() {
        let dto: CreateCommentDto = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert!(!dto.is_internal);
        let dto: CreateCommentDto =
            serde_json::from_str(r#"{"content":"hi","isInternal":true}"#).unwrap();
        assert!(dto.is_internal);
    }

    #[test]
    fn empty_title_is_rejected() {
        let dto = CreateTicketDto {
            title: String::new(),
            description: "Broken".to_string(),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn sla_times_must_be_positive() {
        let dto = CreateSlaDto {
            name: "Urgent".to_string(),
            priority: TicketPriority::Urgent,
            response_time: 0,
            resolution_time: 4,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn assign_reads_camel_case_agent_id() {
        let id = Uuid::new_v4();
        let dto: AssignTicketDto =
            serde_json::from_str(&format!(r#"{{"agentId":"{}"}}"#, id)).unwrap();
        assert_eq!(dto.agent_id, id);
    }
}
