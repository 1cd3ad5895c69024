// src/models/ticketmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use super::{slamodel::Sla, usermodel::UserRole};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    /// Open and in-progress tickets still need work from someone.
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash, Default)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Urgent,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: Option<String>,
    pub user_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub sla_id: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Moves the ticket to `status`. Any transition is allowed. Entering
    /// `resolved` from another status stamps `resolved_at`; nothing clears it.
    pub fn apply_status(&mut self, status: TicketStatus, now: DateTime<Utc>) {
        if status == TicketStatus::Resolved && self.status != TicketStatus::Resolved {
            self.resolved_at = Some(now);
        }
        self.status = status;
    }

    /// Links the ticket to `sla` and derives the due date from creation time.
    pub fn attach_sla(&mut self, sla: Option<&Sla>) {
        self.sla_id = sla.map(|sla| sla.id);
        self.due_date = sla.map(|sla| sla.due_date_from(self.created_at));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: String,
    pub author_role: UserRole,
}

/// Drops internal comments for roles that must not see them.
pub fn visible_comments(comments: Vec<CommentWithAuthor>, viewer: UserRole) -> Vec<CommentWithAuthor> {
    if viewer.is_staff() {
        return comments;
    }
    comments
        .into_iter()
        .filter(|c| !c.comment.is_internal)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub ticket_id: Uuid,
    pub uploaded_by_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentWithUploader {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attachment: Attachment,
    pub uploader_name: String,
}

/// Minimal projection used by the reporting queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketSnapshot {
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub assigned_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<&Ticket> for TicketSnapshot {
    fn from(ticket: &Ticket) -> Self {
        TicketSnapshot {
            status: ticket.status,
            priority: ticket.priority,
            assigned_to_id: ticket.assigned_to_id,
            created_at: ticket.created_at,
            resolved_at: ticket.resolved_at,
            due_date: ticket.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketQueryParams {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
pub(crate) fn sample_ticket(created_at: DateTime<Utc>) -> Ticket {
    Ticket {
        id: Uuid::new_v4(),
        title: "Printer on fire".to_string(),
        description: "Third floor printer is smoking".to_string(),
        status: TicketStatus::Open,
        priority: TicketPriority::Medium,
        category: None,
        user_id: Uuid::new_v4(),
        assigned_to_id: None,
        sla_id: None,
        resolved_at: None,
        due_date: None,
        created_at,
        updated_at: created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn resolving_stamps_resolved_at() {
        let mut ticket = sample_ticket(created());
        let resolved = created() + Duration::hours(5);
        ticket.apply_status(TicketStatus::InProgress, created() + Duration::hours(1));
        assert!(ticket.resolved_at.is_none());

        ticket.apply_status(TicketStatus::Resolved, resolved);
        assert_eq!(ticket.status, TicketStatus::Resolved);
        assert_eq!(ticket.resolved_at, Some(resolved));
    }

    #[test]
    fn reopening_keeps_resolved_at() {
        let mut ticket = sample_ticket(created());
        let resolved = created() + Duration::hours(2);
        ticket.apply_status(TicketStatus::Resolved, resolved);
        ticket.apply_status(TicketStatus::Open, created() + Duration::hours(3));

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.resolved_at, Some(resolved));
    }

    #[test]
    fn resolving_twice_in_a_row_keeps_first_stamp() {
        let mut ticket = sample_ticket(created());
        let first = created() + Duration::hours(2);
        ticket.apply_status(TicketStatus::Resolved, first);
        ticket.apply_status(TicketStatus::Resolved, created() + Duration::hours(9));
        assert_eq!(ticket.resolved_at, Some(first));
    }

    #[test]
    fn resolving_again_after_reopen_restamps() {
        let mut ticket = sample_ticket(created());
        ticket.apply_status(TicketStatus::Resolved, created() + Duration::hours(2));
        ticket.apply_status(TicketStatus::Open, created() + Duration::hours(3));
        let second = created() + Duration::hours(7);
        ticket.apply_status(TicketStatus::Resolved, second);
        assert_eq!(ticket.resolved_at, Some(second));
    }

    #[test]
    fn backward_transitions_are_allowed() {
        let mut ticket = sample_ticket(created());
        ticket.apply_status(TicketStatus::Closed, created());
        ticket.apply_status(TicketStatus::Open, created());
        assert_eq!(ticket.status, TicketStatus::Open);
    }

    fn sla(priority: TicketPriority, resolution_time: i32) -> Sla {
        Sla {
            id: Uuid::new_v4(),
            name: format!("{} tier", priority.to_str()),
            priority,
            response_time: 1,
            resolution_time,
            created_at: created(),
            updated_at: created(),
        }
    }

    #[test]
    fn attaching_sla_sets_due_date_from_creation() {
        let mut ticket = sample_ticket(created());
        let medium = sla(TicketPriority::Medium, 24);
        ticket.attach_sla(Some(&medium));

        assert_eq!(ticket.sla_id, Some(medium.id));
        assert_eq!(ticket.due_date, Some(created() + Duration::hours(24)));
    }

    #[test]
    fn priority_change_recomputes_due_date_from_creation() {
        let mut ticket = sample_ticket(created());
        ticket.attach_sla(Some(&sla(TicketPriority::Medium, 24)));

        // days later the ticket is escalated; the new deadline still counts from creation
        ticket.updated_at = created() + Duration::days(3);
        ticket.priority = TicketPriority::Urgent;
        let urgent = sla(TicketPriority::Urgent, 4);
        ticket.attach_sla(Some(&urgent));

        assert_eq!(ticket.sla_id, Some(urgent.id));
        assert_eq!(ticket.due_date, Some(created() + Duration::hours(4)));
    }

    #[test]
    fn missing_sla_clears_link_and_due_date() {
        let mut ticket = sample_ticket(created());
        ticket.attach_sla(Some(&sla(TicketPriority::Medium, 24)));
        ticket.attach_sla(None);

        assert_eq!(ticket.sla_id, None);
        assert_eq!(ticket.due_date, None);
    }

    fn comment(is_internal: bool) -> CommentWithAuthor {
        CommentWithAuthor {
            comment: Comment {
                id: Uuid::new_v4(),
                content: "note".to_string(),
                ticket_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                is_internal,
                created_at: created(),
                updated_at: created(),
            },
            author_name: "Agent User".to_string(),
            author_role: UserRole::Agent,
        }
    }

    #[test]
    fn users_never_see_internal_comments() {
        let comments = vec![comment(false), comment(true), comment(false)];
        let visible = visible_comments(comments.clone(), UserRole::User);
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|c| !c.comment.is_internal));

        for role in [UserRole::Agent, UserRole::Manager, UserRole::Admin, UserRole::SuperAdmin] {
            assert_eq!(visible_comments(comments.clone(), role).len(), 3);
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let priority: TicketPriority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(priority, TicketPriority::Urgent);
    }
}
