// service/ticket_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::{
        db::DBClient,
        sladb::SlaExt,
        ticketdb::{NewAttachment, NewTicket, TicketExt, TicketFilter},
        userdb::UserExt,
    },
    dtos::ticketdtos::{TicketDetailDto, UserSummaryDto},
    mail::mails::EmailService,
    models::{
        notificationmodel::NotificationType,
        ticketmodel::*,
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        notification_service::NotificationService,
        policy::{self, Action, Relation},
    },
    utils::storage::FileStorage,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default)]
pub struct NewTicketInput {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
}

/// Partial ticket update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TicketChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
    pub status: Option<TicketStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TicketChanges {
    /// Capabilities the actor needs for this set of changes.
    pub fn required_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.title.is_some() || self.description.is_some() || self.category.is_some() {
            actions.push(Action::EditTicketDetails);
        }
        if self.priority.is_some() || self.due_date.is_some() {
            actions.push(Action::ManageTicket);
        }
        if self.status.is_some() {
            actions.push(Action::UpdateTicketStatus);
        }
        actions
    }

    /// Applies the text fields and the status transition.
    fn apply_basics(&self, ticket: &mut Ticket, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            ticket.title = title.clone();
        }
        if let Some(description) = &self.description {
            ticket.description = description.clone();
        }
        if let Some(category) = &self.category {
            ticket.category = normalize_category(Some(category.clone()));
        }
        if let Some(status) = self.status {
            ticket.apply_status(status, now);
        }
    }
}

/// Human readable list of what changed between two versions of a ticket.
pub fn describe_changes(before: &Ticket, after: &Ticket) -> Vec<String> {
    let mut changes = Vec::new();
    if before.title != after.title {
        changes.push("title updated".to_string());
    }
    if before.description != after.description {
        changes.push("description updated".to_string());
    }
    if before.category != after.category {
        changes.push("category updated".to_string());
    }
    if before.status != after.status {
        changes.push(format!("status changed to {}", after.status.to_str()));
    }
    if before.priority != after.priority {
        changes.push(format!("priority changed to {}", after.priority.to_str()));
    }
    if before.due_date != after.due_date {
        changes.push("due date changed".to_string());
    }
    changes
}

pub fn status_notification_type(status: TicketStatus) -> NotificationType {
    if status == TicketStatus::Resolved {
        NotificationType::TicketResolved
    } else {
        NotificationType::TicketUpdated
    }
}

/// Blank categories are stored as no category.
fn normalize_category(category: Option<String>) -> Option<String> {
    category.filter(|c| !c.trim().is_empty())
}

pub fn page_filter(params: &TicketQueryParams) -> TicketFilter {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = params.page.unwrap_or(1).max(1);
    TicketFilter {
        status: params.status,
        priority: params.priority,
        limit,
        offset: (page - 1).saturating_mul(limit),
    }
}

/// Rejects internal comments from roles that may not post them.
pub fn check_comment(actor: &User, ticket: &Ticket, is_internal: bool) -> Result<(), ServiceError> {
    let action = if is_internal {
        Action::CommentInternal
    } else {
        Action::Comment
    };
    policy::authorize_on_ticket(actor, action, ticket)
}

#[derive(Debug, Clone)]
pub struct TicketService {
    db_client: Arc<DBClient>,
    notifications: NotificationService,
    email: EmailService,
    storage: FileStorage,
}

impl TicketService {
    pub fn new(
        db_client: Arc<DBClient>,
        notifications: NotificationService,
        email: EmailService,
        storage: FileStorage,
    ) -> Self {
        Self {
            db_client,
            notifications,
            email,
            storage,
        }
    }

    async fn load_ticket(&self, ticket_id: Uuid) -> Result<Ticket, ServiceError> {
        self.db_client
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(Some(user_id), None)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    /// Attaches the SLA for the ticket's current priority, if one exists.
    async fn reassociate_sla(&self, ticket: &mut Ticket) -> Result<(), ServiceError> {
        let sla = self.db_client.get_sla_for_priority(ticket.priority).await?;
        ticket.attach_sla(sla.as_ref());
        Ok(())
    }

    fn spawn_created_email(&self, ticket: &Ticket, user: &User) {
        let email = self.email.clone();
        let (ticket, user) = (ticket.clone(), user.clone());
        tokio::spawn(async move {
            if let Err(e) = email.send_ticket_created(&ticket, &user).await {
                tracing::warn!("ticket created email for {} failed: {}", ticket.id, e);
            }
        });
    }

    fn spawn_updated_email(&self, ticket: &Ticket, user: &User, updates: String) {
        let email = self.email.clone();
        let (ticket, user) = (ticket.clone(), user.clone());
        tokio::spawn(async move {
            if let Err(e) = email.send_ticket_updated(&ticket, &user, &updates).await {
                tracing::warn!("ticket updated email for {} failed: {}", ticket.id, e);
            }
        });
    }

    fn spawn_assigned_email(&self, ticket: &Ticket, agent: &User) {
        let email = self.email.clone();
        let (ticket, agent) = (ticket.clone(), agent.clone());
        tokio::spawn(async move {
            if let Err(e) = email.send_ticket_assigned(&ticket, &agent).await {
                tracing::warn!("ticket assigned email for {} failed: {}", ticket.id, e);
            }
        });
    }

    /// Tells the creator about a change made to their ticket.
    async fn notify_creator(&self, ticket: &Ticket, notification_type: NotificationType, updates: String) {
        let (title, message) = match notification_type {
            NotificationType::TicketResolved => (
                "Ticket Resolved",
                format!("Your ticket \"{}\" has been resolved", ticket.title),
            ),
            _ => (
                "Ticket Updated",
                format!("Your ticket \"{}\" was updated: {}", ticket.title, updates),
            ),
        };
        self.notifications
            .notify(ticket.user_id, Some(ticket.id), title, message, notification_type)
            .await;

        match self.db_client.get_user(Some(ticket.user_id), None).await {
            Ok(Some(creator)) => self.spawn_updated_email(ticket, &creator, updates),
            Ok(None) => {}
            Err(e) => tracing::warn!("could not load creator of ticket {}: {}", ticket.id, e),
        }
    }

    pub async fn create(&self, actor: &User, input: NewTicketInput) -> Result<Ticket, ServiceError> {
        policy::authorize(actor, Action::CreateTicket, Relation::NONE)?;

        let mut ticket = self
            .db_client
            .create_ticket(NewTicket {
                title: input.title,
                description: input.description,
                priority: input.priority.unwrap_or_default(),
                category: normalize_category(input.category),
                user_id: actor.id,
            })
            .await?;

        self.reassociate_sla(&mut ticket).await?;
        if ticket.sla_id.is_some() {
            ticket = self.db_client.save_ticket(&ticket).await?;
        }

        tracing::info!(
            "ticket {} created by {} with priority {}",
            ticket.id,
            actor.id,
            ticket.priority.to_str()
        );

        self.notifications
            .notify(
                actor.id,
                Some(ticket.id),
                "Ticket Created",
                format!("Your ticket \"{}\" has been created", ticket.title),
                NotificationType::TicketCreated,
            )
            .await;
        self.spawn_created_email(&ticket, actor);

        match self.db_client.get_admin_ids().await {
            Ok(admin_ids) => {
                let recipients: Vec<Uuid> =
                    admin_ids.into_iter().filter(|id| *id != actor.id).collect();
                self.notifications
                    .notify_many(
                        &recipients,
                        Some(ticket.id),
                        "New Ticket",
                        &format!("New {} priority ticket: {}", ticket.priority.to_str(), ticket.title),
                        NotificationType::NewTicket,
                    )
                    .await;
            }
            Err(e) => tracing::warn!("could not load admins for ticket {}: {}", ticket.id, e),
        }

        Ok(ticket)
    }

    pub async fn get(&self, actor: &User, ticket_id: Uuid) -> Result<TicketDetailDto, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;
        policy::authorize_on_ticket(actor, Action::ViewTicket, &ticket)?;

        let creator = self.db_client.get_user(Some(ticket.user_id), None).await?;
        let assigned_to = match ticket.assigned_to_id {
            Some(id) => self.db_client.get_user(Some(id), None).await?,
            None => None,
        };
        let sla = match ticket.sla_id {
            Some(id) => self.db_client.get_sla(id).await?,
            None => None,
        };
        let comments = self.db_client.get_ticket_comments(ticket.id).await?;
        let attachments = self.db_client.get_ticket_attachments(ticket.id).await?;

        Ok(TicketDetailDto {
            creator: creator.as_ref().map(UserSummaryDto::from_user),
            assigned_to: assigned_to.as_ref().map(UserSummaryDto::from_user),
            sla,
            comments: visible_comments(comments, actor.role),
            attachments,
            ticket,
        })
    }

    pub async fn list(&self, actor: &User, params: &TicketQueryParams) -> Result<Vec<Ticket>, ServiceError> {
        let tickets = self
            .db_client
            .get_tickets(policy::ticket_scope(actor), page_filter(params))
            .await?;
        Ok(tickets)
    }

    pub async fn update(
        &self,
        actor: &User,
        ticket_id: Uuid,
        changes: TicketChanges,
    ) -> Result<Ticket, ServiceError> {
        let mut ticket = self.load_ticket(ticket_id).await?;
        let relation = Relation::of(&ticket, actor.id);
        policy::authorize(actor, Action::ViewTicket, relation)?;
        for action in changes.required_actions() {
            policy::authorize(actor, action, relation)?;
        }

        let before = ticket.clone();
        changes.apply_basics(&mut ticket, Utc::now());

        if let Some(priority) = changes.priority {
            if priority != before.priority {
                ticket.priority = priority;
                self.reassociate_sla(&mut ticket).await?;
            }
        }
        if let Some(due_date) = changes.due_date {
            ticket.due_date = Some(due_date);
        }

        let ticket = self.db_client.save_ticket(&ticket).await?;
        let summary = describe_changes(&before, &ticket);
        tracing::info!("ticket {} updated by {}: {:?}", ticket.id, actor.id, summary);

        if before.status != ticket.status {
            self.notify_creator(&ticket, status_notification_type(ticket.status), summary.join(", "))
                .await;
        } else if actor.id != ticket.user_id && !summary.is_empty() {
            self.notify_creator(&ticket, NotificationType::TicketUpdated, summary.join(", "))
                .await;
        }

        Ok(ticket)
    }

    pub async fn update_status(
        &self,
        actor: &User,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Ticket, ServiceError> {
        let mut ticket = self.load_ticket(ticket_id).await?;
        policy::authorize_on_ticket(actor, Action::UpdateTicketStatus, &ticket)?;

        let previous = ticket.status;
        ticket.apply_status(status, Utc::now());
        let ticket = self.db_client.save_ticket(&ticket).await?;

        tracing::info!(
            "ticket {} moved from {} to {} by {}",
            ticket.id,
            previous.to_str(),
            status.to_str(),
            actor.id
        );

        self.notify_creator(
            &ticket,
            status_notification_type(status),
            format!("status changed to {}", status.to_str()),
        )
        .await;

        Ok(ticket)
    }

    pub async fn assign(&self, actor: &User, ticket_id: Uuid, agent_id: Uuid) -> Result<Ticket, ServiceError> {
        policy::authorize(actor, Action::AssignTicket, Relation::NONE)?;

        let ticket = self.load_ticket(ticket_id).await?;
        let agent = self.load_user(agent_id).await?;
        if agent.role != UserRole::Agent || !agent.is_active {
            return Err(ServiceError::Validation(
                "Tickets can only be assigned to active agents".to_string(),
            ));
        }

        let ticket = self.db_client.assign_ticket(ticket.id, agent.id).await?;
        tracing::info!("ticket {} assigned to {} by {}", ticket.id, agent.id, actor.id);

        self.notifications
            .notify(
                agent.id,
                Some(ticket.id),
                "Ticket Assigned",
                format!("You have been assigned to ticket \"{}\"", ticket.title),
                NotificationType::TicketAssigned,
            )
            .await;
        self.spawn_assigned_email(&ticket, &agent);

        Ok(ticket)
    }

    pub async fn delete(&self, actor: &User, ticket_id: Uuid) -> Result<(), ServiceError> {
        policy::authorize(actor, Action::DeleteTicket, Relation::NONE)?;

        let ticket = self.load_ticket(ticket_id).await?;
        let attachments = self.db_client.get_ticket_attachments(ticket.id).await?;
        self.db_client.delete_ticket(ticket.id).await?;

        for attachment in attachments {
            if let Err(e) = self.storage.remove(&attachment.attachment.filename).await {
                tracing::warn!(
                    "could not remove attachment file {}: {}",
                    attachment.attachment.filename,
                    e
                );
            }
        }

        tracing::info!("ticket {} deleted by {}", ticket.id, actor.id);
        Ok(())
    }

    pub async fn add_comment(
        &self,
        actor: &User,
        ticket_id: Uuid,
        content: String,
        is_internal: bool,
    ) -> Result<Comment, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;
        check_comment(actor, &ticket, is_internal)?;

        let comment = self
            .db_client
            .add_comment(ticket.id, actor.id, content, is_internal)
            .await?;
        tracing::debug!("comment {} added to ticket {}", comment.id, ticket.id);

        Ok(comment)
    }

    pub async fn add_attachment(
        &self,
        actor: &User,
        ticket_id: Uuid,
        original_name: String,
        mime_type: String,
        bytes: &[u8],
    ) -> Result<Attachment, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;
        policy::authorize_on_ticket(actor, Action::UploadAttachment, &ticket)?;

        let stored = self
            .storage
            .store(&original_name, bytes)
            .await
            .map_err(|e| ServiceError::Other(format!("failed to store upload: {}", e)))?;

        let attachment = self
            .db_client
            .add_attachment(NewAttachment {
                filename: stored.filename,
                original_name,
                file_path: stored.file_path,
                file_size: stored.size,
                mime_type,
                ticket_id: ticket.id,
                uploaded_by_id: actor.id,
            })
            .await?;

        tracing::info!(
            "attachment {} ({} bytes) uploaded to ticket {}",
            attachment.id,
            attachment.file_size,
            ticket.id
        );
        Ok(attachment)
    }
}
