// service/sla_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, sladb::SlaExt},
    models::{slamodel::Sla, ticketmodel::TicketPriority, usermodel::User},
    service::{
        error::ServiceError,
        policy::{self, Action, Relation},
    },
};

/// Partial SLA update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SlaChanges {
    pub name: Option<String>,
    pub priority: Option<TicketPriority>,
    pub response_time: Option<i32>,
    pub resolution_time: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct SlaService {
    db_client: Arc<DBClient>,
}

impl SlaService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn list(&self, actor: &User) -> Result<Vec<Sla>, ServiceError> {
        policy::authorize(actor, Action::ManageSlas, Relation::NONE)?;
        Ok(self.db_client.get_slas().await?)
    }

    pub async fn create(
        &self,
        actor: &User,
        name: String,
        priority: TicketPriority,
        response_time: i32,
        resolution_time: i32,
    ) -> Result<Sla, ServiceError> {
        policy::authorize(actor, Action::ManageSlas, Relation::NONE)?;

        let sla = self
            .db_client
            .create_sla(name, priority, response_time, resolution_time)
            .await?;

        tracing::info!("sla {} created for {} priority by {}", sla.id, sla.priority.to_str(), actor.id);
        Ok(sla)
    }

    pub async fn update(&self, actor: &User, sla_id: Uuid, changes: SlaChanges) -> Result<Sla, ServiceError> {
        policy::authorize(actor, Action::ManageSlas, Relation::NONE)?;

        let sla = self
            .db_client
            .update_sla(
                sla_id,
                changes.name,
                changes.priority,
                changes.response_time,
                changes.resolution_time,
            )
            .await?
            .ok_or(ServiceError::SlaNotFound(sla_id))?;

        tracing::info!("sla {} updated by {}", sla.id, actor.id);
        Ok(sla)
    }

    /// Tickets keep their computed due dates; only the link is dropped.
    pub async fn delete(&self, actor: &User, sla_id: Uuid) -> Result<(), ServiceError> {
        policy::authorize(actor, Action::ManageSlas, Relation::NONE)?;

        if self.db_client.delete_sla(sla_id).await? == 0 {
            return Err(ServiceError::SlaNotFound(sla_id));
        }

        tracing::info!("sla {} deleted by {}", sla_id, actor.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::{config::test_config, models::usermodel::UserRole};

    fn service() -> SlaService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&test_config().database_url)
            .unwrap();
        SlaService::new(Arc::new(DBClient::new(pool)))
    }

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Sla Tester".to_string(),
            email: "sla@helpdesk.test".to_string(),
            password: String::new(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn only_superadmin_manages_slas() {
        let service = service();
        for role in [UserRole::User, UserRole::Agent, UserRole::Manager, UserRole::Admin] {
            let actor = user(role);

            assert!(matches!(
                service.list(&actor).await,
                Err(ServiceError::Forbidden(_))
            ));
            assert!(matches!(
                service
                    .create(&actor, "Urgent".to_string(), TicketPriority::Urgent, 1, 4)
                    .await,
                Err(ServiceError::Forbidden(_))
            ));
            assert!(matches!(
                service.update(&actor, Uuid::new_v4(), SlaChanges::default()).await,
                Err(ServiceError::Forbidden(_))
            ));
            assert!(matches!(
                service.delete(&actor, Uuid::new_v4()).await,
                Err(ServiceError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn missing_sla_maps_to_not_found() {
        let error = ServiceError::SlaNotFound(Uuid::new_v4());
        assert_eq!(error.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
