//! Tenant storage key derivation.
//!
//! Every tenant-scoped read or write is addressed by a key derived here from
//! the tenant code. Derivation is pure: uppercase, replace anything outside
//! `[A-Z0-9_-]` with `_`, then prefix. The host scope (no code, or `HOST`)
//! maps to a fixed key.

use std::fmt;

use thiserror::Error;

use crate::constants::{HOST_CODE, HOST_STORAGE_KEY, TENANT_KEY_PREFIX, TENANTS_COLLECTION};

/// Errors produced while validating tenant codes.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KeyError {
    /// The code was empty after trimming.
    #[error("Tenant code is required")]
    MissingCode,

    /// The code does not match `^[A-Z0-9-]{3,12}$`.
    #[error("Invalid tenant code '{code}': must be 3-12 characters (letters, numbers, dashes)")]
    InvalidFormat {
        /// The normalized code that failed validation
        code: String,
    },
}

impl KeyError {
    /// All key errors describe malformed input.
    pub fn is_validation_error(&self) -> bool {
        true
    }
}

impl From<KeyError> for crate::Error {
    fn from(err: KeyError) -> Self {
        crate::Error::Key(err)
    }
}

/// Trim and uppercase a user-entered tenant code.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// Normalize and validate a tenant code for creation or login.
pub fn validate_code(input: &str) -> Result<String, KeyError> {
    let code = normalize_code(input);
    if code.is_empty() {
        return Err(KeyError::MissingCode);
    }
    let well_formed = (3..=12).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        return Err(KeyError::InvalidFormat { code });
    }
    Ok(code)
}

fn is_host(code: Option<&str>) -> bool {
    match code {
        None => true,
        Some(c) => c.is_empty() || c.eq_ignore_ascii_case(HOST_CODE),
    }
}

/// Sanitize a tenant code into the form used for document ids.
///
/// `None` and the empty string sanitize to `HOST`.
pub fn sanitize_code(code: Option<&str>) -> String {
    let code = match code {
        Some(c) if !c.is_empty() => c,
        _ => HOST_CODE,
    };
    code.chars()
        .map(|c| {
            let c = c.to_ascii_uppercase();
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive the local cache key for a tenant's data document.
pub fn resolve_key(code: Option<&str>) -> String {
    if is_host(code) {
        return HOST_STORAGE_KEY.to_string();
    }
    format!("{TENANT_KEY_PREFIX}{}", sanitize_code(code))
}

/// Derive the remote document path for a tenant's data document.
pub fn remote_path(code: Option<&str>) -> String {
    format!("{TENANTS_COLLECTION}/{}", sanitize_code(code))
}

/// The storage addresses of one tenant scope.
///
/// Built only through [`TenantScope::host`] or [`TenantScope::tenant`], so
/// the keys always correspond to the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    code: String,
    storage_key: String,
    remote_path: String,
}

impl TenantScope {
    /// The host operator's own scope.
    pub fn host() -> Self {
        Self {
            code: HOST_CODE.to_string(),
            storage_key: resolve_key(None),
            remote_path: remote_path(None),
        }
    }

    /// The scope for `code`. Host aliases collapse to [`TenantScope::host`].
    pub fn tenant(code: &str) -> Self {
        if is_host(Some(code)) {
            return Self::host();
        }
        let code = normalize_code(code);
        Self {
            storage_key: resolve_key(Some(&code)),
            remote_path: remote_path(Some(&code)),
            code,
        }
    }

    /// Tenant code of this scope (`HOST` for the host scope).
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Local cache key for this scope's document.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Remote path for this scope's document.
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Whether this is the host scope.
    pub fn is_host(&self) -> bool {
        self.storage_key == HOST_STORAGE_KEY
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
