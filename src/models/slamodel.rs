use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ticketmodel::TicketPriority;

/// Target response and resolution times, in hours, for one priority tier.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sla {
    pub id: Uuid,
    pub name: String,
    pub priority: TicketPriority,
    pub response_time: i32,
    pub resolution_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sla {
    pub fn due_date_from(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::hours(i64::from(self.resolution_time))
    }
}

/// The tiers seeded when `SEED_DEFAULT_SLAS` is enabled on an empty table.
pub fn default_slas() -> Vec<(&'static str, TicketPriority, i32, i32)> {
    vec![
        ("Low Priority SLA", TicketPriority::Low, 24, 72),
        ("Medium Priority SLA", TicketPriority::Medium, 8, 24),
        ("High Priority SLA", TicketPriority::High, 2, 8),
        ("Urgent Priority SLA", TicketPriority::Urgent, 1, 4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_date_adds_resolution_hours() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let sla = Sla {
            id: Uuid::new_v4(),
            name: "Urgent Priority SLA".to_string(),
            priority: TicketPriority::Urgent,
            response_time: 1,
            resolution_time: 4,
            created_at,
            updated_at: created_at,
        };
        assert_eq!(
            sla.due_date_from(created_at),
            Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn one_default_tier_per_priority() {
        let tiers = default_slas();
        assert_eq!(tiers.len(), TicketPriority::ALL.len());
        for priority in TicketPriority::ALL {
            assert_eq!(tiers.iter().filter(|t| t.1 == priority).count(), 1);
        }
    }
}
