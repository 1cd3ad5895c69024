use super::sendmail::{MailError, Mailer};
use crate::models::{ticketmodel::Ticket, usermodel::User};

const TICKET_CREATED_TEMPLATE: &str = include_str!("templates/ticket-created.html");
const TICKET_UPDATED_TEMPLATE: &str = include_str!("templates/ticket-updated.html");
const TICKET_ASSIGNED_TEMPLATE: &str = include_str!("templates/ticket-assigned.html");

/// Ticket notification emails.
#[derive(Debug, Clone)]
pub struct EmailService {
    mailer: Mailer,
}

fn ticket_placeholders(ticket: &Ticket, recipient: &User) -> Vec<(&'static str, String)> {
    vec![
        ("name", recipient.name.clone()),
        ("ticket_id", ticket.id.to_string()),
        ("title", ticket.title.clone()),
        ("status", ticket.status.to_str().to_string()),
        ("priority", ticket.priority.to_str().to_string()),
    ]
}

impl EmailService {
    pub fn new(mailer: Mailer) -> Self {
        Self { mailer }
    }

    pub async fn send_ticket_created(&self, ticket: &Ticket, user: &User) -> Result<(), MailError> {
        let subject = format!("Ticket Created: {}", ticket.title);
        self.mailer
            .send_email(
                &user.email,
                &subject,
                TICKET_CREATED_TEMPLATE,
                &ticket_placeholders(ticket, user),
            )
            .await
    }

    pub async fn send_ticket_updated(
        &self,
        ticket: &Ticket,
        user: &User,
        updates: &str,
    ) -> Result<(), MailError> {
        let subject = format!("Ticket Updated: {}", ticket.title);
        let mut placeholders = ticket_placeholders(ticket, user);
        placeholders.push(("updates", updates.to_string()));

        self.mailer
            .send_email(&user.email, &subject, TICKET_UPDATED_TEMPLATE, &placeholders)
            .await
    }

    pub async fn send_ticket_assigned(&self, ticket: &Ticket, agent: &User) -> Result<(), MailError> {
        let subject = format!("New Ticket Assigned: {}", ticket.title);
        self.mailer
            .send_email(
                &agent.email,
                &subject,
                TICKET_ASSIGNED_TEMPLATE,
                &ticket_placeholders(ticket, agent),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::sendmail::render_template;

    #[test]
    fn templates_cover_every_placeholder() {
        let ticket = crate::models::ticketmodel::sample_ticket(chrono::Utc::now());
        let user = crate::models::usermodel::User {
            id: ticket.user_id,
            name: "Grace".to_string(),
            email: "grace@helpdesk.test".to_string(),
            password: String::new(),
            role: crate::models::usermodel::UserRole::User,
            is_active: true,
            created_at: ticket.created_at,
            updated_at: ticket.created_at,
        };

        let mut placeholders = ticket_placeholders(&ticket, &user);
        placeholders.push(("updates", "Status changed to resolved".to_string()));

        for template in [
            TICKET_CREATED_TEMPLATE,
            TICKET_UPDATED_TEMPLATE,
            TICKET_ASSIGNED_TEMPLATE,
        ] {
            let html = render_template(template, &placeholders);
            assert!(!html.contains("{{"), "unfilled placeholder in {}", html);
            assert!(html.contains("Grace"));
        }
    }
}
