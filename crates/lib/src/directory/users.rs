//! Sub-user management inside the active tenant document.

use tracing::info;

use super::{DirectoryError, unique_id};
use crate::{
    context::TenantContext,
    model::{Status, SubUser, UserRole},
    phone::{normalize_phone, phones_match},
};

/// Input for [`UserDirectory::add`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub role: UserRole,
}

/// Changes for [`UserDirectory::update`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<Status>,
}

/// Sub-users of the context's active tenant.
///
/// Changes go through the context's working copy and are saved like any
/// other document edit. Permission checks are left to the caller
/// ([`TenantContext::require`]).
#[derive(Debug, Clone, Copy)]
pub struct UserDirectory<'a> {
    ctx: &'a TenantContext,
}

impl<'a> UserDirectory<'a> {
    pub fn new(ctx: &'a TenantContext) -> Self {
        Self { ctx }
    }

    pub fn list(&self) -> Vec<SubUser> {
        self.ctx.document().users
    }

    pub fn get(&self, id: &str) -> Result<SubUser, DirectoryError> {
        self.ctx
            .document()
            .users
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(|| DirectoryError::UserNotFound { id: id.to_string() })
    }

    pub fn add(&self, new: NewUser) -> Result<SubUser, DirectoryError> {
        self.check_tenant_scope()?;
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DirectoryError::MissingName);
        }
        let phone = normalize_phone(&new.phone);
        if phone.is_empty() {
            return Err(DirectoryError::MissingPhone);
        }
        self.check_phone_free(&phone, None)?;

        let clock = self.ctx.sync().clock();
        let now = clock.timestamp();
        let existing = self.ctx.document().users;
        let user = SubUser {
            id: unique_id(clock.as_ref(), "USR", |id| existing.iter().any(|u| u.id == id)),
            name,
            phone,
            role: new.role,
            status: Status::Active,
            created_at: now.clone(),
            updated_at: now,
        };
        self.ctx.update(|doc| doc.users.push(user.clone()))?;
        info!(tenant = %self.ctx.scope(), id = %user.id, role = ?user.role, "Added sub-user");
        Ok(user)
    }

    pub fn update(&self, id: &str, changes: UserUpdate) -> Result<SubUser, DirectoryError> {
        self.check_tenant_scope()?;
        let name = match changes.name {
            Some(name) if name.trim().is_empty() => return Err(DirectoryError::MissingName),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let phone = match changes.phone {
            Some(phone) => {
                let phone = normalize_phone(&phone);
                if phone.is_empty() {
                    return Err(DirectoryError::MissingPhone);
                }
                self.check_phone_free(&phone, Some(id))?;
                Some(phone)
            }
            None => None,
        };
        let now = self.ctx.sync().clock().timestamp();

        let updated = self.ctx.update(|doc| {
            let user = doc.users.iter_mut().find(|u| u.id == id)?;
            if let Some(name) = name {
                user.name = name;
            }
            if let Some(phone) = phone {
                user.phone = phone;
            }
            if let Some(role) = changes.role {
                user.role = role;
            }
            if let Some(status) = changes.status {
                user.status = status;
            }
            user.updated_at = now;
            Some(user.clone())
        })?;
        let updated = updated.ok_or_else(|| DirectoryError::UserNotFound { id: id.to_string() })?;
        info!(tenant = %self.ctx.scope(), id, "Updated sub-user");
        Ok(updated)
    }

    /// Flip a sub-user between active and suspended.
    pub fn toggle_status(&self, id: &str) -> Result<SubUser, DirectoryError> {
        let status = self.get(id)?.status.toggled();
        self.update(
            id,
            UserUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    /// Remove a sub-user. The logged-in actor cannot remove themselves.
    pub fn delete(&self, id: &str) -> Result<SubUser, DirectoryError> {
        self.check_tenant_scope()?;
        let user = self.get(id)?;
        if let Some(session) = self.ctx.session()
            && phones_match(&session.phone, &user.phone)
        {
            return Err(DirectoryError::CannotDeleteSelf);
        }
        self.ctx.update(|doc| doc.users.retain(|u| u.id != id))?;
        info!(tenant = %self.ctx.scope(), id, "Deleted sub-user");
        Ok(user)
    }

    fn check_tenant_scope(&self) -> Result<(), DirectoryError> {
        if self.ctx.scope().is_host() {
            return Err(DirectoryError::NoActiveTenant);
        }
        Ok(())
    }

    fn check_phone_free(&self, phone: &str, owner: Option<&str>) -> Result<(), DirectoryError> {
        let taken = self
            .ctx
            .document()
            .users
            .iter()
            .any(|u| Some(u.id.as_str()) != owner && phones_match(&u.phone, phone));
        if taken {
            return Err(DirectoryError::DuplicatePhone {
                phone: phone.to_string(),
            });
        }
        Ok(())
    }
}
