//! Capability table for every role.
//!
//! Handlers never compare roles directly; they describe what they are about
//! to do as an [`Action`], work out how the actor relates to the ticket and
//! ask [`authorize`].

use uuid::Uuid;

use crate::{
    db::ticketdb::TicketScope,
    models::{
        ticketmodel::Ticket,
        usermodel::{User, UserRole},
    },
    service::error::ServiceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateTicket,
    ListAllTickets,
    ViewTicket,
    /// Title, description and category.
    EditTicketDetails,
    /// Priority and due date.
    ManageTicket,
    UpdateTicketStatus,
    AssignTicket,
    DeleteTicket,
    Comment,
    CommentInternal,
    UploadAttachment,
    ViewAdminStats,
    ManageUsers,
    /// Granting admin/superadmin or editing accounts that hold those roles.
    ManagePrivilegedUsers,
    ViewTeamReports,
    ViewSystemStats,
    ManageSlas,
}

/// How the actor is connected to the ticket an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relation {
    pub creator: bool,
    pub assignee: bool,
}

impl Relation {
    pub const NONE: Relation = Relation {
        creator: false,
        assignee: false,
    };

    pub fn of(ticket: &Ticket, actor_id: Uuid) -> Self {
        Relation {
            creator: ticket.user_id == actor_id,
            assignee: ticket.assigned_to_id == Some(actor_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    Always,
    IfCreator,
    IfAssignee,
    IfCreatorOrAssignee,
    Never,
}

fn grant(role: UserRole, action: Action) -> Grant {
    use Action::*;
    use Grant::*;

    match role {
        UserRole::SuperAdmin => Always,
        UserRole::Admin => match action {
            ManagePrivilegedUsers | ViewSystemStats | ManageSlas => Never,
            _ => Always,
        },
        UserRole::Manager => match action {
            CreateTicket | ListAllTickets | ViewTicket | ViewTeamReports => Always,
            Comment | CommentInternal => Always,
            EditTicketDetails | UploadAttachment => IfCreator,
            _ => Never,
        },
        UserRole::Agent => match action {
            CreateTicket => Always,
            ViewTicket | EditTicketDetails | UploadAttachment => IfCreatorOrAssignee,
            Comment | CommentInternal => IfCreatorOrAssignee,
            ManageTicket | UpdateTicketStatus => IfAssignee,
            _ => Never,
        },
        UserRole::User => match action {
            CreateTicket => Always,
            ViewTicket | EditTicketDetails | Comment | UploadAttachment => IfCreator,
            _ => Never,
        },
    }
}

pub fn is_allowed(role: UserRole, action: Action, relation: Relation) -> bool {
    match grant(role, action) {
        Grant::Always => true,
        Grant::IfCreator => relation.creator,
        Grant::IfAssignee => relation.assignee,
        Grant::IfCreatorOrAssignee => relation.creator || relation.assignee,
        Grant::Never => false,
    }
}

/// Allowed regardless of which ticket is involved.
pub fn is_allowed_unconditionally(role: UserRole, action: Action) -> bool {
    grant(role, action) == Grant::Always
}

pub fn authorize(actor: &User, action: Action, relation: Relation) -> Result<(), ServiceError> {
    if is_allowed(actor.role, action, relation) {
        Ok(())
    } else {
        tracing::debug!(
            "denied {:?} for user {} ({}) with {:?}",
            action,
            actor.id,
            actor.role.to_str(),
            relation
        );
        Err(ServiceError::forbidden())
    }
}

pub fn authorize_on_ticket(actor: &User, action: Action, ticket: &Ticket) -> Result<(), ServiceError> {
    authorize(actor, action, Relation::of(ticket, actor.id))
}

/// The slice of tickets a listing returns for this actor.
pub fn ticket_scope(actor: &User) -> TicketScope {
    if is_allowed_unconditionally(actor.role, Action::ListAllTickets) {
        TicketScope::All
    } else if actor.role == UserRole::Agent {
        TicketScope::AssignedTo(actor.id)
    } else {
        TicketScope::CreatedBy(actor.id)
    }
}
