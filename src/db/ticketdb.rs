// src/db/ticketdb.rs
use async_trait::async_trait;
use sqlx::{Error, Postgres, QueryBuilder};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ticketmodel::*;

/// Which tickets a listing may return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TicketScope {
    All,
    CreatedBy(Uuid),
    AssignedTo(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub limit: i64,
    pub offset: i64,
}

pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: Option<String>,
    pub user_id: Uuid,
}

pub struct NewAttachment {
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub ticket_id: Uuid,
    pub uploaded_by_id: Uuid,
}

#[async_trait]
pub trait TicketExt {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, Error>;

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error>;

    async fn get_tickets(
        &self,
        scope: TicketScope,
        filter: TicketFilter,
    ) -> Result<Vec<Ticket>, Error>;

    /// Writes every mutable column of `ticket` back. Last write wins.
    async fn save_ticket(&self, ticket: &Ticket) -> Result<Ticket, Error>;

    async fn assign_ticket(&self, ticket_id: Uuid, assigned_to: Uuid) -> Result<Ticket, Error>;

    async fn delete_ticket(&self, ticket_id: Uuid) -> Result<u64, Error>;

    async fn add_comment(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        content: String,
        is_internal: bool,
    ) -> Result<Comment, Error>;

    async fn get_ticket_comments(&self, ticket_id: Uuid) -> Result<Vec<CommentWithAuthor>, Error>;

    async fn add_attachment(&self, attachment: NewAttachment) -> Result<Attachment, Error>;

    async fn get_ticket_attachments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<AttachmentWithUploader>, Error>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (title, description, priority, category, user_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(ticket.title)
        .bind(ticket.description)
        .bind(ticket.priority)
        .bind(ticket.category)
        .bind(ticket.user_id)
        .bind(TicketStatus::Open)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(r#"SELECT * FROM tickets WHERE id = $1"#)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn get_tickets(
        &self,
        scope: TicketScope,
        filter: TicketFilter,
    ) -> Result<Vec<Ticket>, Error> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM tickets WHERE TRUE");

        match scope {
            TicketScope::All => {}
            TicketScope::CreatedBy(user_id) => {
                query.push(" AND user_id = ").push_bind(user_id);
            }
            TicketScope::AssignedTo(user_id) => {
                query.push(" AND assigned_to_id = ").push_bind(user_id);
            }
        }

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }

        if let Some(priority) = filter.priority {
            query.push(" AND priority = ").push_bind(priority);
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let tickets = query
            .build_query_as::<Ticket>()
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn save_ticket(&self, ticket: &Ticket) -> Result<Ticket, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET title = $1,
                description = $2,
                status = $3,
                priority = $4,
                category = $5,
                sla_id = $6,
                resolved_at = $7,
                due_date = $8,
                updated_at = NOW()
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status)
        .bind(ticket.priority)
        .bind(&ticket.category)
        .bind(ticket.sla_id)
        .bind(ticket.resolved_at)
        .bind(ticket.due_date)
        .bind(ticket.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn assign_ticket(&self, ticket_id: Uuid, assigned_to: Uuid) -> Result<Ticket, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET assigned_to_id = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(assigned_to)
        .bind(ticket_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn delete_ticket(&self, ticket_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(r#"DELETE FROM tickets WHERE id = $1"#)
            .bind(ticket_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn add_comment(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        content: String,
        is_internal: bool,
    ) -> Result<Comment, Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (ticket_id, user_id, content, is_internal)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(content)
        .bind(is_internal)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn get_ticket_comments(&self, ticket_id: Uuid) -> Result<Vec<CommentWithAuthor>, Error> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT
                c.*,
                u.name AS author_name,
                u.role AS author_role
            FROM comments c
            JOIN users u ON c.user_id = u.id
            WHERE c.ticket_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn add_attachment(&self, attachment: NewAttachment) -> Result<Attachment, Error> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments
                (filename, original_name, file_path, file_size, mime_type, ticket_id, uploaded_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(attachment.filename)
        .bind(attachment.original_name)
        .bind(attachment.file_path)
        .bind(attachment.file_size)
        .bind(attachment.mime_type)
        .bind(attachment.ticket_id)
        .bind(attachment.uploaded_by_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(attachment)
    }

    async fn get_ticket_attachments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<AttachmentWithUploader>, Error> {
        let attachments = sqlx::query_as::<_, AttachmentWithUploader>(
            r#"
            SELECT
                a.*,
                u.name AS uploader_name
            FROM attachments a
            JOIN users u ON a.uploaded_by_id = u.id
            WHERE a.ticket_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }
}
