use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{slamodel::Sla, ticketmodel::TicketPriority};

#[async_trait]
pub trait SlaExt {
    async fn get_slas(&self) -> Result<Vec<Sla>, Error>;

    async fn get_sla(&self, sla_id: Uuid) -> Result<Option<Sla>, Error>;

    /// The oldest SLA for a priority tier, if any.
    async fn get_sla_for_priority(&self, priority: TicketPriority) -> Result<Option<Sla>, Error>;

    async fn create_sla(
        &self,
        name: String,
        priority: TicketPriority,
        response_time: i32,
        resolution_time: i32,
    ) -> Result<Sla, Error>;

    async fn update_sla(
        &self,
        sla_id: Uuid,
        name: Option<String>,
        priority: Option<TicketPriority>,
        response_time: Option<i32>,
        resolution_time: Option<i32>,
    ) -> Result<Option<Sla>, Error>;

    async fn delete_sla(&self, sla_id: Uuid) -> Result<u64, Error>;

    async fn get_sla_count(&self) -> Result<i64, Error>;
}

#[async_trait]
impl SlaExt for DBClient {
    async fn get_slas(&self) -> Result<Vec<Sla>, Error> {
        let slas = sqlx::query_as::<_, Sla>(
            r#"
            SELECT * FROM slas
            ORDER BY resolution_time ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(slas)
    }

    async fn get_sla(&self, sla_id: Uuid) -> Result<Option<Sla>, Error> {
        let sla = sqlx::query_as::<_, Sla>(r#"SELECT * FROM slas WHERE id = $1"#)
            .bind(sla_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sla)
    }

    async fn get_sla_for_priority(&self, priority: TicketPriority) -> Result<Option<Sla>, Error> {
        let sla = sqlx::query_as::<_, Sla>(
            r#"
            SELECT * FROM slas
            WHERE priority = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(priority)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sla)
    }

    async fn create_sla(
        &self,
        name: String,
        priority: TicketPriority,
        response_time: i32,
        resolution_time: i32,
    ) -> Result<Sla, Error> {
        let sla = sqlx::query_as::<_, Sla>(
            r#"
            INSERT INTO slas (name, priority, response_time, resolution_time)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(priority)
        .bind(response_time)
        .bind(resolution_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(sla)
    }

    async fn update_sla(
        &self,
        sla_id: Uuid,
        name: Option<String>,
        priority: Option<TicketPriority>,
        response_time: Option<i32>,
        resolution_time: Option<i32>,
    ) -> Result<Option<Sla>, Error> {
        let sla = sqlx::query_as::<_, Sla>(
            r#"
            UPDATE slas
            SET name = COALESCE($1, name),
                priority = COALESCE($2, priority),
                response_time = COALESCE($3, response_time),
                resolution_time = COALESCE($4, resolution_time),
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(priority)
        .bind(response_time)
        .bind(resolution_time)
        .bind(sla_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sla)
    }

    async fn delete_sla(&self, sla_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(r#"DELETE FROM slas WHERE id = $1"#)
            .bind(sla_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn get_sla_count(&self) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM slas"#)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
