//! Application state shared across handlers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use llama_treats_core::TaxRate;

use crate::bakery::BakeryApi;
use crate::config::StorefrontConfig;
use crate::middleware::session_lock::SessionLocks;

/// Where "now" comes from when evaluating specials and pickup dates.
#[derive(Debug, Clone, Copy)]
enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the bakery API client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: Arc<dyn BakeryApi>,
    clock: Clock,
    session_locks: SessionLocks,
    confirmations: Arc<Mutex<HashSet<String>>>,
}

impl AppStateInner {
    fn new(config: StorefrontConfig, api: Arc<dyn BakeryApi>, clock: Clock) -> Self {
        Self {
            config,
            api,
            clock,
            session_locks: SessionLocks::new(),
            confirmations: Arc::default(),
        }
    }
}

/// Marks a payment session as being confirmed. Released on drop.
#[derive(Debug)]
pub struct ConfirmationClaim {
    session_id: String,
    confirmations: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ConfirmationClaim {
    fn drop(&mut self) {
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, api: Arc<dyn BakeryApi>) -> Self {
        Self {
            inner: Arc::new(AppStateInner::new(config, api, Clock::System)),
        }
    }

    /// Create a state whose clock is frozen at `now`.
    #[must_use]
    pub fn with_fixed_clock(
        config: StorefrontConfig,
        api: Arc<dyn BakeryApi>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner::new(config, api, Clock::Fixed(now))),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the bakery API client.
    #[must_use]
    pub fn api(&self) -> &dyn BakeryApi {
        self.inner.api.as_ref()
    }

    #[must_use]
    pub fn tax_rate(&self) -> TaxRate {
        self.inner.config.tax_rate
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self.inner.clock {
            Clock::System => Utc::now(),
            Clock::Fixed(now) => now,
        }
    }

    /// Per-session request locks.
    #[must_use]
    pub fn session_locks(&self) -> &SessionLocks {
        &self.inner.session_locks
    }

    /// Claim `payment_session_id` for confirmation. `None` while another
    /// request holds it.
    #[must_use]
    pub fn claim_confirmation(&self, payment_session_id: &str) -> Option<ConfirmationClaim> {
        let mut in_flight = self
            .inner
            .confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(payment_session_id.to_owned()) {
            return None;
        }
        Some(ConfirmationClaim {
            session_id: payment_session_id.to_owned(),
            confirmations: Arc::clone(&self.inner.confirmations),
        })
    }
}
