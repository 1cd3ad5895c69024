// service/stats_service.rs
//! Dashboard rollups. Every view is recomputed from a fresh load of the
//! ticket snapshots and users; the aggregation itself is pure so it can be
//! checked without a database.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    config::HealthThresholds,
    db::{db::DBClient, statsdb::StatsExt},
    dtos::statsdtos::*,
    models::{
        ticketmodel::{TicketPriority, TicketSnapshot, TicketStatus},
        usermodel::{User, UserRole, UserSnapshot},
    },
    service::{
        error::ServiceError,
        policy::{self, Action, Relation},
    },
};

const RECENT_WINDOW_DAYS: i64 = 7;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn count<'a, I, F>(tickets: I, predicate: F) -> i64
where
    I: IntoIterator<Item = &'a TicketSnapshot>,
    F: Fn(&TicketSnapshot) -> bool,
{
    tickets.into_iter().filter(|t| predicate(t)).count() as i64
}

/// Mean hours from creation to resolution over resolved tickets, two decimals.
pub fn average_resolution_hours<'a, I>(tickets: I) -> f64
where
    I: IntoIterator<Item = &'a TicketSnapshot>,
{
    let durations: Vec<f64> = tickets
        .into_iter()
        .filter(|t| t.status == TicketStatus::Resolved)
        .filter_map(|t| t.resolved_at.map(|resolved| resolved - t.created_at))
        .map(|elapsed| elapsed.num_seconds() as f64 / 3600.0)
        .collect();

    if durations.is_empty() {
        return 0.0;
    }
    round2(durations.iter().sum::<f64>() / durations.len() as f64)
}

pub fn resolution_rate(resolved: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (resolved as f64 / total as f64 * 100.0).round() as i64
}

fn is_unassigned(ticket: &TicketSnapshot) -> bool {
    ticket.assigned_to_id.is_none() && ticket.status.is_active()
}

fn is_overdue(ticket: &TicketSnapshot, now: DateTime<Utc>) -> bool {
    ticket.status.is_active() && ticket.due_date.map_or(false, |due| due < now)
}

fn is_active_urgent(ticket: &TicketSnapshot) -> bool {
    ticket.priority == TicketPriority::Urgent && ticket.status.is_active()
}

fn status_counts<'a, I>(tickets: I) -> Vec<StatusCountDto>
where
    I: IntoIterator<Item = &'a TicketSnapshot> + Clone,
{
    TicketStatus::ALL
        .into_iter()
        .map(|status| StatusCountDto {
            status,
            count: count(tickets.clone(), |t| t.status == status),
        })
        .collect()
}

fn priority_counts<'a, I>(tickets: I) -> Vec<PriorityCountDto>
where
    I: IntoIterator<Item = &'a TicketSnapshot> + Clone,
{
    TicketPriority::ALL
        .into_iter()
        .map(|priority| PriorityCountDto {
            priority,
            count: count(tickets.clone(), |t| t.priority == priority),
        })
        .collect()
}

fn role_counts(users: &[UserSnapshot]) -> Vec<RoleCountDto> {
    UserRole::ALL
        .into_iter()
        .map(|role| RoleCountDto {
            role,
            count: users.iter().filter(|u| u.role == role).count() as i64,
        })
        .collect()
}

pub fn admin_stats(tickets: &[TicketSnapshot], users: &[UserSnapshot], now: DateTime<Utc>) -> AdminStatsDto {
    let recent_since = now - Duration::days(RECENT_WINDOW_DAYS);

    let ticket_counts = TicketCountsDto {
        total: tickets.len() as i64,
        open: count(tickets, |t| t.status == TicketStatus::Open),
        in_progress: count(tickets, |t| t.status == TicketStatus::InProgress),
        resolved: count(tickets, |t| t.status == TicketStatus::Resolved),
        closed: count(tickets, |t| t.status == TicketStatus::Closed),
        recent: count(tickets, |t| t.created_at >= recent_since),
        unassigned: count(tickets, is_unassigned),
    };

    let by_role: BTreeMap<String, i64> = role_counts(users)
        .into_iter()
        .map(|rc| (rc.role.to_str().to_string(), rc.count))
        .collect();

    let user_counts = UserCountsDto {
        total: users.len() as i64,
        agents: by_role.get("agent").copied().unwrap_or(0),
        admins: by_role.get("admin").copied().unwrap_or(0),
        by_role,
    };

    AdminStatsDto {
        tickets: ticket_counts,
        users: user_counts,
        tickets_by_priority: priority_counts(tickets)
            .into_iter()
            .map(|pc| (pc.priority.to_str().to_string(), pc.count))
            .collect(),
        tickets_by_status: status_counts(tickets)
            .into_iter()
            .map(|sc| (sc.status.to_str().to_string(), sc.count))
            .collect(),
        average_resolution_hours: average_resolution_hours(tickets),
    }
}

fn agents(users: &[UserSnapshot]) -> impl Iterator<Item = &UserSnapshot> {
    users.iter().filter(|u| u.role == UserRole::Agent)
}

/// Tickets assigned to any user with the agent role.
pub fn team_tickets<'a>(tickets: &'a [TicketSnapshot], users: &[UserSnapshot]) -> Vec<&'a TicketSnapshot> {
    let team: Vec<Uuid> = agents(users).map(|u| u.id).collect();
    tickets
        .iter()
        .filter(|t| t.assigned_to_id.map_or(false, |id| team.contains(&id)))
        .collect()
}

pub fn team_summary(tickets: &[TicketSnapshot], users: &[UserSnapshot]) -> TeamSummaryDto {
    let team = team_tickets(tickets, users);
    let total = team.len() as i64;
    let resolved = count(team.iter().copied(), |t| t.status == TicketStatus::Resolved);

    TeamSummaryDto {
        total_members: agents(users).count() as i64,
        total_tickets: total,
        open: count(team.iter().copied(), |t| t.status == TicketStatus::Open),
        in_progress: count(team.iter().copied(), |t| t.status == TicketStatus::InProgress),
        resolved,
        closed: count(team.iter().copied(), |t| t.status == TicketStatus::Closed),
        urgent: count(team.iter().copied(), |t| t.priority == TicketPriority::Urgent),
        resolution_rate: resolution_rate(resolved, total),
    }
}

pub fn agent_performance(tickets: &[TicketSnapshot], users: &[UserSnapshot]) -> Vec<AgentPerformanceDto> {
    agents(users)
        .map(|agent| {
            let assigned: Vec<&TicketSnapshot> = tickets
                .iter()
                .filter(|t| t.assigned_to_id == Some(agent.id))
                .collect();
            let total = assigned.len() as i64;
            let resolved = count(assigned.iter().copied(), |t| t.status == TicketStatus::Resolved);

            AgentPerformanceDto {
                id: agent.id,
                name: agent.name.clone(),
                email: agent.email.clone(),
                is_active: agent.is_active,
                assigned_tickets: total,
                resolved_tickets: resolved,
                active_tickets: count(assigned.iter().copied(), |t| t.status.is_active()),
                resolution_rate: resolution_rate(resolved, total),
                avg_resolution_hours: average_resolution_hours(assigned.iter().copied()),
            }
        })
        .collect()
}

pub fn agent_workload(tickets: &[TicketSnapshot], users: &[UserSnapshot]) -> Vec<AgentWorkloadDto> {
    agents(users)
        .filter(|agent| agent.is_active)
        .map(|agent| {
            let mine = || tickets.iter().filter(|t| t.assigned_to_id == Some(agent.id));
            AgentWorkloadDto {
                id: agent.id,
                name: agent.name.clone(),
                email: agent.email.clone(),
                open_tickets: count(mine(), |t| t.status == TicketStatus::Open),
                in_progress_tickets: count(mine(), |t| t.status == TicketStatus::InProgress),
            }
        })
        .collect()
}

pub fn team_priority_report(tickets: &[TicketSnapshot], users: &[UserSnapshot]) -> Vec<PriorityCountDto> {
    priority_counts(team_tickets(tickets, users).into_iter())
}

pub fn team_status_report(tickets: &[TicketSnapshot], users: &[UserSnapshot]) -> Vec<StatusCountDto> {
    status_counts(team_tickets(tickets, users).into_iter())
}

pub fn system_stats(tickets: &[TicketSnapshot], users: &[UserSnapshot]) -> SystemStatsDto {
    SystemStatsDto {
        users: SystemUserStatsDto {
            total: users.len() as i64,
            active: users.iter().filter(|u| u.is_active).count() as i64,
            by_role: role_counts(users),
        },
        tickets: SystemTicketStatsDto {
            total: tickets.len() as i64,
            by_status: status_counts(tickets),
            by_priority: priority_counts(tickets),
            average_resolution_hours: average_resolution_hours(tickets),
        },
    }
}

pub fn system_health(
    tickets: &[TicketSnapshot],
    users: &[UserSnapshot],
    now: DateTime<Utc>,
    thresholds: &HealthThresholds,
) -> SystemHealthDto {
    let unassigned = count(tickets, is_unassigned);
    let overdue = count(tickets, |t| is_overdue(t, now));
    let urgent = count(tickets, is_active_urgent);
    let inactive_agents = agents(users).filter(|u| !u.is_active).count() as i64;

    let degraded = unassigned > thresholds.max_unassigned
        || overdue > thresholds.max_overdue
        || urgent > thresholds.max_urgent
        || inactive_agents > thresholds.max_inactive_agents;

    SystemHealthDto {
        status: if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        },
        unassigned_tickets: unassigned,
        overdue_tickets: overdue,
        urgent_tickets: urgent,
        inactive_agents,
    }
}

#[derive(Debug, Clone)]
pub struct StatsService {
    db_client: Arc<DBClient>,
    thresholds: HealthThresholds,
}

impl StatsService {
    pub fn new(db_client: Arc<DBClient>, thresholds: HealthThresholds) -> Self {
        Self {
            db_client,
            thresholds,
        }
    }

    async fn load(&self) -> Result<(Vec<TicketSnapshot>, Vec<UserSnapshot>), ServiceError> {
        let tickets = self.db_client.get_ticket_snapshots().await?;
        let users = self.db_client.get_user_snapshots().await?;
        tracing::debug!("aggregating {} tickets over {} users", tickets.len(), users.len());
        Ok((tickets, users))
    }

    pub async fn admin_stats(&self, actor: &User) -> Result<AdminStatsDto, ServiceError> {
        policy::authorize(actor, Action::ViewAdminStats, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        Ok(admin_stats(&tickets, &users, Utc::now()))
    }

    pub async fn team_summary(&self, actor: &User) -> Result<TeamSummaryDto, ServiceError> {
        policy::authorize(actor, Action::ViewTeamReports, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        Ok(team_summary(&tickets, &users))
    }

    pub async fn agent_performance(&self, actor: &User) -> Result<Vec<AgentPerformanceDto>, ServiceError> {
        policy::authorize(actor, Action::ViewTeamReports, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        Ok(agent_performance(&tickets, &users))
    }

    pub async fn agent_workload(&self, actor: &User) -> Result<Vec<AgentWorkloadDto>, ServiceError> {
        policy::authorize(actor, Action::ViewTeamReports, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        Ok(agent_workload(&tickets, &users))
    }

    pub async fn team_priority_report(&self, actor: &User) -> Result<Vec<PriorityCountDto>, ServiceError> {
        policy::authorize(actor, Action::ViewTeamReports, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        Ok(team_priority_report(&tickets, &users))
    }

    pub async fn team_status_report(&self, actor: &User) -> Result<Vec<StatusCountDto>, ServiceError> {
        policy::authorize(actor, Action::ViewTeamReports, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        Ok(team_status_report(&tickets, &users))
    }

    pub async fn system_stats(&self, actor: &User) -> Result<SystemStatsDto, ServiceError> {
        policy::authorize(actor, Action::ViewSystemStats, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        Ok(system_stats(&tickets, &users))
    }

    pub async fn system_health(&self, actor: &User) -> Result<SystemHealthDto, ServiceError> {
        policy::authorize(actor, Action::ViewSystemStats, Relation::NONE)?;
        let (tickets, users) = self.load().await?;
        let health = system_health(&tickets, &users, Utc::now(), &self.thresholds);
        if health.status == HealthStatus::Degraded {
            tracing::warn!("system health degraded: {:?}", health);
        }
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn snapshot(status: TicketStatus, priority: TicketPriority) -> TicketSnapshot {
        TicketSnapshot {
            status,
            priority,
            assigned_to_id: None,
            created_at: now() - Duration::days(30),
            resolved_at: None,
            due_date: None,
        }
    }

    fn user(role: UserRole, is_active: bool) -> UserSnapshot {
        UserSnapshot {
            id: Uuid::new_v4(),
            name: format!("{} person", role.to_str()),
            email: format!("{}@helpdesk.test", Uuid::new_v4()),
            role,
            is_active,
        }
    }

    fn mixed_tickets() -> Vec<TicketSnapshot> {
        let mut tickets = Vec::new();
        for status in TicketStatus::ALL {
            for priority in TicketPriority::ALL {
                tickets.push(snapshot(status, priority));
            }
        }
        tickets.push(snapshot(TicketStatus::Open, TicketPriority::High));
        tickets
    }

    #[test]
    fn status_counts_partition_total() {
        let tickets = mixed_tickets();
        let stats = admin_stats(&tickets, &[], now());
        let t = &stats.tickets;
        assert_eq!(t.open + t.in_progress + t.resolved + t.closed, t.total);
        assert_eq!(stats.tickets_by_status.values().sum::<i64>(), t.total);
        assert_eq!(stats.tickets_by_priority.values().sum::<i64>(), t.total);
        assert_eq!(t.total, 17);
    }

    #[test]
    fn average_over_no_resolved_is_zero() {
        let tickets = vec![snapshot(TicketStatus::Open, TicketPriority::Low)];
        assert_eq!(average_resolution_hours(&tickets), 0.0);
        assert_eq!(average_resolution_hours(&Vec::<TicketSnapshot>::new()), 0.0);
    }

    #[test]
    fn single_ticket_resolved_after_five_hours() {
        let mut ticket = snapshot(TicketStatus::Resolved, TicketPriority::Medium);
        ticket.resolved_at = Some(ticket.created_at + Duration::hours(5));
        let stats = admin_stats(&[ticket], &[], now());
        assert_eq!(stats.average_resolution_hours, 5.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        let mut a = snapshot(TicketStatus::Resolved, TicketPriority::Low);
        a.resolved_at = Some(a.created_at + Duration::minutes(20));
        let mut b = snapshot(TicketStatus::Resolved, TicketPriority::Low);
        b.resolved_at = Some(b.created_at + Duration::hours(1));
        // (1/3 + 1) / 2 = 0.6666..
        assert_eq!(average_resolution_hours(&[a, b]), 0.67);
    }

    #[test]
    fn closed_tickets_do_not_count_towards_resolution_time() {
        let mut closed = snapshot(TicketStatus::Closed, TicketPriority::Low);
        closed.resolved_at = Some(closed.created_at + Duration::hours(50));
        let mut resolved = snapshot(TicketStatus::Resolved, TicketPriority::Low);
        resolved.resolved_at = Some(resolved.created_at + Duration::hours(2));
        assert_eq!(average_resolution_hours(&[closed, resolved]), 2.0);
    }

    #[test]
    fn new_urgent_ticket_moves_counters_by_one() {
        let tickets = mixed_tickets();
        let before = admin_stats(&tickets, &[], now());

        let mut with_new = tickets.clone();
        let mut fresh = snapshot(TicketStatus::Open, TicketPriority::Urgent);
        fresh.created_at = now();
        with_new.push(fresh);
        let after = admin_stats(&with_new, &[], now());

        assert_eq!(after.tickets.total, before.tickets.total + 1);
        assert_eq!(after.tickets.unassigned, before.tickets.unassigned + 1);
        assert_eq!(after.tickets.recent, before.tickets.recent + 1);
        assert_eq!(
            after.tickets_by_priority["urgent"],
            before.tickets_by_priority["urgent"] + 1
        );
    }

    #[test]
    fn recent_window_is_seven_days_inclusive() {
        let mut edge = snapshot(TicketStatus::Open, TicketPriority::Low);
        edge.created_at = now() - Duration::days(7);
        let mut older = snapshot(TicketStatus::Open, TicketPriority::Low);
        older.created_at = now() - Duration::days(7) - Duration::seconds(1);
        let stats = admin_stats(&[edge, older], &[], now());
        assert_eq!(stats.tickets.recent, 1);
    }

    #[test]
    fn unassigned_ignores_finished_tickets() {
        let tickets = vec![
            snapshot(TicketStatus::Open, TicketPriority::Low),
            snapshot(TicketStatus::InProgress, TicketPriority::Low),
            snapshot(TicketStatus::Resolved, TicketPriority::Low),
            snapshot(TicketStatus::Closed, TicketPriority::Low),
        ];
        assert_eq!(admin_stats(&tickets, &[], now()).tickets.unassigned, 2);
    }

    #[test]
    fn user_counts_are_zero_filled() {
        let users = vec![user(UserRole::Agent, true), user(UserRole::Admin, true)];
        let stats = admin_stats(&[], &users, now());
        assert_eq!(stats.users.total, 2);
        assert_eq!(stats.users.agents, 1);
        assert_eq!(stats.users.admins, 1);
        assert_eq!(stats.users.by_role.len(), UserRole::ALL.len());
        assert_eq!(stats.users.by_role["manager"], 0);
    }

    #[test]
    fn team_views_only_count_agent_tickets() {
        let agent = user(UserRole::Agent, true);
        let admin = user(UserRole::Admin, true);
        let users = vec![agent.clone(), admin.clone(), user(UserRole::Manager, true)];

        let mut mine = snapshot(TicketStatus::Resolved, TicketPriority::Urgent);
        mine.assigned_to_id = Some(agent.id);
        mine.resolved_at = Some(mine.created_at + Duration::hours(3));
        let mut open = snapshot(TicketStatus::Open, TicketPriority::Low);
        open.assigned_to_id = Some(agent.id);
        let mut admins = snapshot(TicketStatus::Open, TicketPriority::Low);
        admins.assigned_to_id = Some(admin.id);
        let tickets = vec![mine, open, admins, snapshot(TicketStatus::Open, TicketPriority::Low)];

        let summary = team_summary(&tickets, &users);
        assert_eq!(summary.total_members, 1);
        assert_eq!(summary.total_tickets, 2);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.urgent, 1);
        assert_eq!(summary.resolution_rate, 50);

        let performance = agent_performance(&tickets, &users);
        assert_eq!(performance.len(), 1);
        assert_eq!(performance[0].assigned_tickets, 2);
        assert_eq!(performance[0].active_tickets, 1);
        assert_eq!(performance[0].avg_resolution_hours, 3.0);

        let report = team_priority_report(&tickets, &users);
        assert_eq!(report.len(), TicketPriority::ALL.len());
        assert_eq!(report.iter().map(|r| r.count).sum::<i64>(), 2);
    }

    #[test]
    fn empty_team_has_zero_rate() {
        let summary = team_summary(&[], &[]);
        assert_eq!(summary, TeamSummaryDto::default());
        assert!(team_status_report(&[], &[]).iter().all(|r| r.count == 0));
    }

    #[test]
    fn resolution_rate_rounds() {
        assert_eq!(resolution_rate(1, 3), 33);
        assert_eq!(resolution_rate(2, 3), 67);
        assert_eq!(resolution_rate(0, 0), 0);
    }

    #[test]
    fn workload_skips_inactive_agents() {
        let active = user(UserRole::Agent, true);
        let inactive = user(UserRole::Agent, false);
        let mut open = snapshot(TicketStatus::Open, TicketPriority::Low);
        open.assigned_to_id = Some(active.id);
        let mut working = snapshot(TicketStatus::InProgress, TicketPriority::Low);
        working.assigned_to_id = Some(active.id);

        let workload = agent_workload(&[open, working], &[active.clone(), inactive]);
        assert_eq!(workload.len(), 1);
        assert_eq!(workload[0].id, active.id);
        assert_eq!(workload[0].open_tickets, 1);
        assert_eq!(workload[0].in_progress_tickets, 1);
    }

    #[test]
    fn health_degrades_past_thresholds() {
        let thresholds = HealthThresholds::default();
        let users = vec![user(UserRole::Agent, false)];
        let healthy = system_health(&[], &users, now(), &thresholds);
        assert_eq!(healthy.status, HealthStatus::Healthy);
        assert_eq!(healthy.inactive_agents, 1);

        let urgent: Vec<TicketSnapshot> = (0..6)
            .map(|_| snapshot(TicketStatus::InProgress, TicketPriority::Urgent))
            .collect();
        let health = system_health(&urgent, &users, now(), &thresholds);
        assert_eq!(health.urgent_tickets, 6);
        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[test]
    fn overdue_needs_active_status_and_past_due_date() {
        let mut late = snapshot(TicketStatus::Open, TicketPriority::Low);
        late.due_date = Some(now() - Duration::hours(1));
        let mut done = snapshot(TicketStatus::Resolved, TicketPriority::Low);
        done.due_date = Some(now() - Duration::hours(1));
        let mut pending = snapshot(TicketStatus::Open, TicketPriority::Low);
        pending.due_date = Some(now() + Duration::hours(1));

        let health = system_health(&[late, done, pending], &[], now(), &HealthThresholds::default());
        assert_eq!(health.overdue_tickets, 1);
    }

    #[test]
    fn system_stats_lists_every_enum_value() {
        let users = vec![user(UserRole::User, true), user(UserRole::Agent, false)];
        let stats = system_stats(&mixed_tickets(), &users);
        assert_eq!(stats.users.total, 2);
        assert_eq!(stats.users.active, 1);
        assert_eq!(stats.users.by_role.len(), UserRole::ALL.len());
        assert_eq!(stats.tickets.by_status.len(), TicketStatus::ALL.len());
        assert_eq!(stats.tickets.by_priority.iter().map(|p| p.count).sum::<i64>(), 17);
    }

    fn account(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dashboard Viewer".to_string(),
            email: "viewer@helpdesk.test".to_string(),
            password: String::new(),
            role,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn dashboards_check_the_viewer_capability() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&crate::config::test_config().database_url)
            .unwrap();
        let service = StatsService::new(Arc::new(DBClient::new(pool)), HealthThresholds::default());

        let manager = account(UserRole::Manager);
        assert!(matches!(service.admin_stats(&manager).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(service.system_health(&manager).await, Err(ServiceError::Forbidden(_))));

        let admin = account(UserRole::Admin);
        assert!(matches!(service.system_stats(&admin).await, Err(ServiceError::Forbidden(_))));

        let agent = account(UserRole::Agent);
        assert!(matches!(service.team_summary(&agent).await, Err(ServiceError::Forbidden(_))));
    }
}
