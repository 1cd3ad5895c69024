// service/user_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::Config,
    db::{
        db::DBClient,
        sladb::SlaExt,
        userdb::{UserChanges, UserExt},
    },
    error::ErrorMessage,
    models::{
        slamodel::default_slas,
        usermodel::{User, UserRole},
    },
    service::{
        error::{conflict_on_unique, ServiceError},
        policy::{self, Action, Relation},
    },
    utils::password,
};

/// Guards account management against self-lockout and privilege escalation.
///
/// Self role changes and self deactivation are validation errors. Touching an
/// admin or superadmin account, or handing out one of those roles, requires
/// the privileged capability.
pub fn check_user_update(actor: &User, target: &User, changes: &UserChanges) -> Result<(), ServiceError> {
    if actor.id == target.id {
        if changes.role.map_or(false, |role| role != actor.role) {
            return Err(ServiceError::Validation(
                ErrorMessage::CannotChangeOwnRole.to_string(),
            ));
        }
        if changes.is_active == Some(false) {
            return Err(ServiceError::Validation(
                ErrorMessage::CannotDeactivateSelf.to_string(),
            ));
        }
    }

    policy::authorize(actor, Action::ManageUsers, Relation::NONE)?;

    let touches_privileged_account = actor.id != target.id && target.role.is_admin();
    let grants_privileged_role = changes
        .role
        .map_or(false, |role| role.is_admin() && role != target.role);
    if touches_privileged_account || grants_privileged_role {
        policy::authorize(actor, Action::ManagePrivilegedUsers, Relation::NONE)?;
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct UserService {
    db_client: Arc<DBClient>,
}

impl UserService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(Some(user_id), None)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, ServiceError> {
        policy::authorize(actor, Action::ManageUsers, Relation::NONE)?;
        Ok(self.db_client.get_users().await?)
    }

    /// Active agents ordered by name; the assignment picker.
    pub async fn list_active_agents(&self, actor: &User) -> Result<Vec<User>, ServiceError> {
        policy::authorize(actor, Action::AssignTicket, Relation::NONE)?;
        Ok(self.db_client.get_users_by_role(UserRole::Agent, true).await?)
    }

    pub async fn create_user(
        &self,
        actor: &User,
        name: String,
        email: String,
        password: String,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        policy::authorize(actor, Action::ManageUsers, Relation::NONE)?;
        if role.is_admin() {
            policy::authorize(actor, Action::ManagePrivilegedUsers, Relation::NONE)?;
        }

        let hashed_password = password::hash(password)?;
        let user = self
            .db_client
            .save_user(name, email, hashed_password, role)
            .await
            .map_err(|e| conflict_on_unique(e, ErrorMessage::EmailExist))?;

        tracing::info!("user {} created with role {} by {}", user.id, role.to_str(), actor.id);
        Ok(user)
    }

    pub async fn update_user(
        &self,
        actor: &User,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<User, ServiceError> {
        let target = self.load_user(user_id).await?;
        check_user_update(actor, &target, &changes)?;

        let user = self
            .db_client
            .update_user(target.id, changes)
            .await
            .map_err(|e| conflict_on_unique(e, ErrorMessage::EmailExist))?;

        tracing::info!("user {} updated by {}", user.id, actor.id);
        Ok(user)
    }

    /// Users are never removed; deleting an account only deactivates it.
    pub async fn deactivate_user(&self, actor: &User, user_id: Uuid) -> Result<User, ServiceError> {
        self.update_user(
            actor,
            user_id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }
}

/// Startup data: default SLA tiers and the first superadmin, each only when
/// enabled in configuration and the target table is still empty.
pub async fn seed_defaults(db_client: &DBClient, config: &Config) -> Result<(), ServiceError> {
    if config.seed_default_slas && db_client.get_sla_count().await? == 0 {
        for (name, priority, response_time, resolution_time) in default_slas() {
            db_client
                .create_sla(name.to_string(), priority, response_time, resolution_time)
                .await?;
        }
        tracing::info!("seeded default SLA tiers");
    }

    if let Some(bootstrap) = &config.bootstrap_admin {
        if db_client.get_user_count().await? == 0 {
            let hashed_password = password::hash(bootstrap.password.clone())?;
            let user = db_client
                .save_user(
                    "Super Admin".to_string(),
                    bootstrap.email.clone(),
                    hashed_password,
                    UserRole::SuperAdmin,
                )
                .await?;
            tracing::info!("created bootstrap superadmin {}", user.email);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Member".to_string(),
            email: "member@helpdesk.test".to_string(),
            password: String::new(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn cannot_change_own_role() {
        let admin = user(UserRole::Admin);
        let changes = UserChanges {
            role: Some(UserRole::User),
            ..Default::default()
        };
        let err = check_user_update(&admin, &admin, &changes).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "Cannot change your own role"));
    }

    #[test]
    fn cannot_deactivate_self() {
        let superadmin = user(UserRole::SuperAdmin);
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            check_user_update(&superadmin, &superadmin, &changes),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn restating_own_role_is_allowed() {
        let admin = user(UserRole::Admin);
        let changes = UserChanges {
            name: Some("Renamed".to_string()),
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        assert!(check_user_update(&admin, &admin, &changes).is_ok());
    }

    #[test]
    fn admin_cannot_grant_or_edit_privileged_roles() {
        let admin = user(UserRole::Admin);
        let agent = user(UserRole::Agent);
        let promote = UserChanges {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        assert!(matches!(
            check_user_update(&admin, &agent, &promote),
            Err(ServiceError::Forbidden(_))
        ));

        let other_admin = user(UserRole::Admin);
        let rename = UserChanges {
            name: Some("New".to_string()),
            ..Default::default()
        };
        assert!(check_user_update(&admin, &other_admin, &rename).is_err());

        let demote = UserChanges {
            role: Some(UserRole::Manager),
            ..Default::default()
        };
        assert!(check_user_update(&admin, &agent, &demote).is_ok());
    }

    #[test]
    fn superadmin_may_elevate() {
        let superadmin = user(UserRole::SuperAdmin);
        let agent = user(UserRole::Agent);
        let promote = UserChanges {
            role: Some(UserRole::SuperAdmin),
            ..Default::default()
        };
        assert!(check_user_update(&superadmin, &agent, &promote).is_ok());
    }

    #[test]
    fn non_admins_cannot_manage_users() {
        let manager = user(UserRole::Manager);
        let agent = user(UserRole::Agent);
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            check_user_update(&manager, &agent, &changes),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
