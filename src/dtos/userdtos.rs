// dtos/userdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::userdb::UserChanges,
    models::usermodel::{User, UserRole},
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub password: String,

    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::User
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl From<UpdateUserDto> for UserChanges {
    fn from(dto: UpdateUserDto) -> Self {
        UserChanges {
            name: dto.name,
            email: dto.email,
            role: dto.role,
            is_active: dto.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

/// Entry in the agent picker.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl AgentDto {
    pub fn filter_agents(users: &[User]) -> Vec<AgentDto> {
        users
            .iter()
            .map(|user| AgentDto {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validates_email_and_password() {
        let mut dto = RegisterUserDto {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
        };
        assert!(dto.validate().is_err());

        dto.email = "ada@helpdesk.test".to_string();
        assert!(dto.validate().is_ok());

        dto.password = "123".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn create_user_defaults_to_user_role() {
        let dto: CreateUserDto = serde_json::from_str(
            r#"{"name":"Bob","email":"bob@helpdesk.test","password":"hunter22"}"#,
        )
        .unwrap();
        assert_eq!(dto.role, UserRole::User);
    }

    #[test]
    fn update_reads_is_active() {
        let dto: UpdateUserDto = serde_json::from_str(r#"{"isActive":false}"#).unwrap();
        let changes: UserChanges = dto.into();
        assert_eq!(changes.is_active, Some(false));
        assert!(changes.role.is_none());
    }

    #[test]
    fn filtered_user_has_no_password() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Eve".to_string(),
            email: "eve@helpdesk.test".to_string(),
            password: "$argon2id$hash".to_string(),
            role: UserRole::Agent,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(FilterUserDto::filter_user(&user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "agent");
        assert_eq!(json["isActive"], true);
    }
}
