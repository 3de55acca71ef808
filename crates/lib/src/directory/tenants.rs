//! Host-side tenant management over the shared registry.

use tracing::{info, warn};

use super::{DirectoryError, unique_id};
use crate::{
    cache::LocalCacheExt,
    constants::HOST_CODE,
    keys::{TenantScope, validate_code},
    model::{Registry, Status, Tenant, TenantAppData},
    phone::normalize_phone,
    sync::{SyncCoordinator, SyncError},
};

/// Input for [`TenantDirectory::create`].
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub code: String,
    pub name: String,
    pub phone: String,
    pub notes: Option<String>,
}

/// Changes for [`TenantDirectory::update`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct TenantUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Registry-level tenant operations available to the host.
#[derive(Debug, Clone)]
pub struct TenantDirectory {
    sync: SyncCoordinator,
}

fn required_name(name: &str) -> Result<String, DirectoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DirectoryError::MissingName);
    }
    Ok(name.to_string())
}

fn required_phone(phone: &str) -> Result<String, DirectoryError> {
    let phone = normalize_phone(phone);
    if phone.is_empty() {
        return Err(DirectoryError::MissingPhone);
    }
    Ok(phone)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Check that `code` is free for the tenant `owner` (or for a new tenant).
fn check_code_free(registry: &Registry, code: &str, owner: Option<&str>) -> Result<(), DirectoryError> {
    if code.eq_ignore_ascii_case(HOST_CODE) {
        return Err(DirectoryError::ReservedCode { code: code.to_string() });
    }
    let others = || registry.tenants.iter().filter(move |t| Some(t.id.as_str()) != owner);
    if others().any(|t| t.has_code(code)) {
        return Err(DirectoryError::DuplicateCode { code: code.to_string() });
    }
    let key = TenantScope::tenant(code);
    if let Some(existing) = others().find(|t| TenantScope::tenant(&t.code).storage_key() == key.storage_key()) {
        return Err(DirectoryError::StorageKeyCollision {
            code: code.to_string(),
            existing: existing.code.clone(),
        });
    }
    Ok(())
}

impl TenantDirectory {
    pub fn new(sync: SyncCoordinator) -> Self {
        Self { sync }
    }

    /// All tenants in the cached registry.
    pub fn list(&self) -> Result<Vec<Tenant>, DirectoryError> {
        Ok(self.sync.load_registry()?.tenants)
    }

    pub fn get(&self, id: &str) -> Result<Tenant, DirectoryError> {
        self.sync
            .load_registry()?
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| DirectoryError::TenantNotFound { id: id.to_string() })
    }

    /// Find a tenant by code, ignoring case.
    pub fn find(&self, code: &str) -> Result<Option<Tenant>, DirectoryError> {
        Ok(self.sync.load_registry()?.find_tenant(code).cloned())
    }

    /// Write the demo registry unless a registry with tenants already exists.
    ///
    /// Returns `true` if the demo data was written.
    pub fn seed_demo(&self) -> Result<bool, DirectoryError> {
        if let Some(existing) = self.sync.registry_local()?
            && !existing.tenants.is_empty()
        {
            return Ok(false);
        }
        let registry = Registry::seeded(self.sync.clock().as_ref());
        for tenant in &registry.tenants {
            self.ensure_document(&TenantScope::tenant(&tenant.code))?;
        }
        self.sync.save_registry(&registry)?;
        info!(tenants = registry.tenants.len(), "Seeded demo registry");
        Ok(true)
    }

    /// Add a tenant to the registry.
    ///
    /// The tenant's data document is created in the local cache only; it
    /// reaches the remote tier when the tenant first logs in.
    pub fn create(&self, new: NewTenant) -> Result<Tenant, DirectoryError> {
        let code = validate_code(&new.code)?;
        let name = required_name(&new.name)?;
        let phone = required_phone(&new.phone)?;

        let mut registry = self.sync.load_registry()?;
        check_code_free(&registry, &code, None)?;

        let clock = self.sync.clock();
        let now = clock.timestamp();
        let tenant = Tenant {
            id: unique_id(clock.as_ref(), "TN", |id| registry.find_by_id(id).is_some()),
            code: code.clone(),
            name,
            phone,
            status: Status::Active,
            notes: non_empty(new.notes),
            created_at: now.clone(),
            updated_at: now,
            is_discovered: false,
        };

        self.ensure_document(&TenantScope::tenant(&code))?;
        registry.tenants.push(tenant.clone());
        self.sync.save_registry(&registry)?;
        info!(tenant = %code, id = %tenant.id, "Created tenant");
        Ok(tenant)
    }

    /// Edit a tenant. A code change moves its data document in both tiers.
    pub async fn update(&self, id: &str, changes: TenantUpdate) -> Result<Tenant, DirectoryError> {
        let mut registry = self.sync.load_registry()?;
        let current = registry
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| DirectoryError::TenantNotFound { id: id.to_string() })?;

        let new_code = match &changes.code {
            Some(code) => {
                let code = validate_code(code)?;
                if code != current.code {
                    check_code_free(&registry, &code, Some(id))?;
                    Some(code)
                } else {
                    None
                }
            }
            None => None,
        };
        let name = changes.name.as_deref().map(required_name).transpose()?;
        let phone = changes.phone.as_deref().map(required_phone).transpose()?;

        if let Some(code) = &new_code {
            let from = TenantScope::tenant(&current.code);
            let to = TenantScope::tenant(code);
            if let Err(e) = self.sync.move_document(&from, &to).await {
                warn!(from = %from, to = %to, error = %e, "Remote document move failed");
            }
        }

        let now = self.sync.clock().timestamp();
        let Some(tenant) = registry.find_by_id_mut(id) else {
            return Err(DirectoryError::TenantNotFound { id: id.to_string() });
        };
        if let Some(code) = new_code {
            tenant.code = code;
        }
        if let Some(name) = name {
            tenant.name = name;
        }
        if let Some(phone) = phone {
            tenant.phone = phone;
        }
        if changes.notes.is_some() {
            tenant.notes = non_empty(changes.notes);
        }
        tenant.updated_at = now;
        let updated = tenant.clone();

        self.sync.save_registry(&registry)?;
        info!(tenant = %updated.code, id, "Updated tenant");
        Ok(updated)
    }

    /// Flip a tenant between active and suspended.
    pub fn toggle_status(&self, id: &str) -> Result<Tenant, DirectoryError> {
        let status = self.get(id)?.status.toggled();
        self.set_status(id, status)
    }

    pub fn set_status(&self, id: &str, status: Status) -> Result<Tenant, DirectoryError> {
        let mut registry = self.sync.load_registry()?;
        let now = self.sync.clock().timestamp();
        let tenant = registry
            .find_by_id_mut(id)
            .ok_or_else(|| DirectoryError::TenantNotFound { id: id.to_string() })?;
        tenant.status = status;
        tenant.updated_at = now;
        let updated = tenant.clone();
        self.sync.save_registry(&registry)?;
        info!(tenant = %updated.code, status = ?status, "Changed tenant status");
        Ok(updated)
    }

    /// Remove a tenant and its data document from both tiers.
    pub fn delete(&self, id: &str) -> Result<Tenant, DirectoryError> {
        let mut registry = self.sync.load_registry()?;
        let index = registry
            .tenants
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| DirectoryError::TenantNotFound { id: id.to_string() })?;
        let removed = registry.tenants.remove(index);
        self.sync.save_registry(&registry)?;
        self.sync.remove(&TenantScope::tenant(&removed.code));
        info!(tenant = %removed.code, id, "Deleted tenant");
        Ok(removed)
    }

    /// Write an empty document for `scope` to the local cache if none exists.
    fn ensure_document(&self, scope: &TenantScope) -> Result<(), DirectoryError> {
        let cache = self.sync.cache();
        if cache.get_item(scope.storage_key()).is_none() {
            cache
                .set_document(scope.storage_key(), &TenantAppData::default())
                .map_err(SyncError::from)?;
        }
        Ok(())
    }
}
