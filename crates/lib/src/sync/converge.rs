//! Bounded retry-until-satisfied loop.

use std::{future::Future, time::Duration};

use tokio::time::{Instant, sleep_until, timeout_at};

use crate::{keys::normalize_code, model::Registry};

/// Result of one convergence attempt, and of the loop as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    Satisfied,
    /// Not yet; for a whole loop, the deadline passed first.
    Pending,
    /// The channel being polled went away; stop early.
    Degraded,
}

/// Run `attempt` immediately and then every `interval` until it reports
/// [`Probe::Satisfied`], reports [`Probe::Degraded`], or `deadline` passes
/// ([`Probe::Pending`]). Returns how the loop ended.
///
/// An attempt still running at the deadline is cancelled.
pub(crate) async fn converge<F, Fut>(deadline: Instant, interval: Duration, mut attempt: F) -> Probe
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe>,
{
    loop {
        match timeout_at(deadline, attempt()).await {
            Ok(Probe::Pending) => {}
            Ok(done) => return done,
            Err(_) => return Probe::Pending,
        }
        let next = Instant::now() + interval;
        if next >= deadline {
            return Probe::Pending;
        }
        sleep_until(next).await;
    }
}

/// What a registry convergence wait is waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RegistryWait {
    /// Any registry document at all.
    Any,
    /// A registry listing this (normalized) tenant code.
    Tenant(String),
}

impl RegistryWait {
    pub(crate) fn new(required: Option<&str>) -> Self {
        match required.map(normalize_code) {
            Some(code) if !code.is_empty() => RegistryWait::Tenant(code),
            _ => RegistryWait::Any,
        }
    }

    pub(crate) fn is_satisfied(&self, registry: Option<&Registry>) -> bool {
        match (self, registry) {
            (_, None) => false,
            (RegistryWait::Any, Some(_)) => true,
            (RegistryWait::Tenant(code), Some(registry)) => registry.contains_tenant(code),
        }
    }
}
