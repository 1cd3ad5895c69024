// dtos/statsdtos.rs
use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    ticketmodel::{TicketPriority, TicketStatus},
    usermodel::UserRole,
};

#[derive(Debug, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketCountsDto {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub recent: i64,
    pub unassigned: i64,
}

#[derive(Debug, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserCountsDto {
    pub total: i64,
    pub agents: i64,
    pub admins: i64,
    pub by_role: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsDto {
    pub tickets: TicketCountsDto,
    pub users: UserCountsDto,
    pub tickets_by_priority: BTreeMap<String, i64>,
    pub tickets_by_status: BTreeMap<String, i64>,
    pub average_resolution_hours: f64,
}

#[derive(Debug, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummaryDto {
    pub total_members: i64,
    pub total_tickets: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub urgent: i64,
    /// Percentage of team tickets resolved, rounded to a whole number.
    pub resolution_rate: i64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformanceDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub assigned_tickets: i64,
    pub resolved_tickets: i64,
    pub active_tickets: i64,
    pub resolution_rate: i64,
    pub avg_resolution_hours: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentWorkloadDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PriorityCountDto {
    pub priority: TicketPriority,
    pub count: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StatusCountDto {
    pub status: TicketStatus,
    pub count: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RoleCountDto {
    pub role: UserRole,
    pub count: i64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemUserStatsDto {
    pub total: i64,
    pub active: i64,
    pub by_role: Vec<RoleCountDto>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemTicketStatsDto {
    pub total: i64,
    pub by_status: Vec<StatusCountDto>,
    pub by_priority: Vec<PriorityCountDto>,
    pub average_resolution_hours: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SystemStatsDto {
    pub users: SystemUserStatsDto,
    pub tickets: SystemTicketStatsDto,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealthDto {
    pub status: HealthStatus,
    pub unassigned_tickets: i64,
    pub overdue_tickets: i64,
    pub urgent_tickets: i64,
    pub inactive_agents: i64,
}
