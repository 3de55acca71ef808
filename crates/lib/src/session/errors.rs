//! Error types for login and session transitions.

use thiserror::Error;

use crate::{keys::KeyError, sync::SyncError};

/// Why a session transition failed.
///
/// `Display` gives the detailed reason for logs; [`user_message`] gives the
/// text to show the actor.
///
/// [`user_message`]: SessionError::user_message
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Phone number is required")]
    MissingPhone,

    #[error("Phone number is too short")]
    PhoneTooShort,

    #[error(transparent)]
    InvalidTenantCode(#[from] KeyError),

    /// No tenant with this code in the registry or by discovery.
    #[error("No tenant with code '{code}'")]
    UnknownTenant { code: String },

    /// Neither the tenant's phone nor any sub-user's phone matched.
    #[error("Phone does not match any account for tenant '{code}'")]
    PhoneMismatch { code: String },

    #[error("Tenant '{code}' is suspended")]
    TenantSuspended { code: String },

    #[error("Sub-user '{name}' of tenant '{code}' is suspended")]
    SubUserSuspended { code: String, name: String },

    /// The host account is claimed by a different phone.
    #[error("Host account already claimed by a different phone")]
    HostPhoneMismatch,

    /// There is no host account to return to.
    #[error("No host account registered")]
    NoHostAccount,

    /// The transition needs a host session.
    #[error("Only a host session can do this")]
    NotHost,

    /// `return_to_host` outside a host-as-tenant session.
    #[error("Not viewing a tenant as host")]
    NotViewingTenant,

    /// Storage or transport failure while resolving the login.
    #[error("Session storage failed")]
    System {
        #[source]
        source: Box<crate::Error>,
    },
}

impl SessionError {
    /// Malformed input from the actor.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            SessionError::MissingPhone | SessionError::PhoneTooShort | SessionError::InvalidTenantCode(_)
        )
    }

    /// Unknown tenant or unmatched phone.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SessionError::UnknownTenant { .. } | SessionError::PhoneMismatch { .. }
        )
    }

    /// The accounts exist but are in a state that forbids the transition.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            SessionError::TenantSuspended { .. }
                | SessionError::SubUserSuspended { .. }
                | SessionError::HostPhoneMismatch
                | SessionError::NoHostAccount
                | SessionError::NotHost
                | SessionError::NotViewingTenant
        )
    }

    /// Retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::System { source } => source.is_transient(),
            _ => false,
        }
    }

    /// Text to show the actor.
    ///
    /// Not-found failures share one message so it does not reveal whether
    /// the code or the phone was wrong. System failures never expose the
    /// underlying transport error.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::MissingPhone | SessionError::PhoneTooShort => {
                "Please enter a valid phone number.".into()
            }
            SessionError::InvalidTenantCode(KeyError::MissingCode) => {
                "Please enter your tenant code.".into()
            }
            SessionError::InvalidTenantCode(_) => {
                "Tenant code must be 3-12 characters (letters, numbers, dashes).".into()
            }
            SessionError::UnknownTenant { .. } | SessionError::PhoneMismatch { .. } => {
                "Invalid tenant code or phone number. Please check and try again.".into()
            }
            SessionError::TenantSuspended { .. } => {
                "This tenant account is suspended. Contact administrator.".into()
            }
            SessionError::SubUserSuspended { .. } => {
                "Your user account is suspended. Contact your administrator.".into()
            }
            SessionError::HostPhoneMismatch => {
                "Host account already exists with a different phone number. Access denied.".into()
            }
            SessionError::NoHostAccount => "No host account is registered.".into(),
            SessionError::NotHost => "Only the host can view tenant accounts.".into(),
            SessionError::NotViewingTenant => "You are not viewing a tenant.".into(),
            SessionError::System { .. } => {
                "A system error occurred. Please try again.".into()
            }
        }
    }
}

impl From<SyncError> for SessionError {
    fn from(err: SyncError) -> Self {
        SessionError::System {
            source: Box::new(err.into()),
        }
    }
}

impl From<crate::Error> for SessionError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::Session(e) => e,
            other => SessionError::System {
                source: Box::new(other),
            },
        }
    }
}

impl From<SessionError> for crate::Error {
    fn from(err: SessionError) -> Self {
        crate::Error::Session(err)
    }
}
