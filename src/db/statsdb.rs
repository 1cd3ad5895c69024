use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::{ticketmodel::TicketSnapshot, usermodel::UserSnapshot};

#[async_trait]
pub trait StatsExt {
    /// Every ticket reduced to the columns the dashboards aggregate over.
    async fn get_ticket_snapshots(&self) -> Result<Vec<TicketSnapshot>, Error>;

    async fn get_user_snapshots(&self) -> Result<Vec<UserSnapshot>, Error>;
}

#[async_trait]
impl StatsExt for DBClient {
    async fn get_ticket_snapshots(&self) -> Result<Vec<TicketSnapshot>, Error> {
        let snapshots = sqlx::query_as::<_, TicketSnapshot>(
            r#"
            SELECT status, priority, assigned_to_id, created_at, resolved_at, due_date
            FROM tickets
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshots)
    }

    async fn get_user_snapshots(&self) -> Result<Vec<UserSnapshot>, Error> {
        let snapshots = sqlx::query_as::<_, UserSnapshot>(
            r#"
            SELECT id, name, email, role, is_active
            FROM users
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshots)
    }
}
