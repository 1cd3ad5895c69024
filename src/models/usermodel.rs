use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Agent,
    Manager,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub const ALL: [UserRole; 5] = [
        UserRole::User,
        UserRole::Agent,
        UserRole::Manager,
        UserRole::Admin,
        UserRole::SuperAdmin,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            UserRole::User => "user",
            UserRole::Agent => "agent",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "superadmin",
        }
    }

    /// Every role except `user` works tickets on behalf of the helpdesk.
    pub fn is_staff(&self) -> bool {
        !matches!(self, UserRole::User)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    #[serde(rename = "isActive")]
    pub is_active: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Account fields the dashboards need; never carries the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSnapshot {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
}

/// Emails are stored and compared in one canonical form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
