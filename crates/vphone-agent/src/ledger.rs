//! Location subscription ledger.
//!
//! Host components request location updates with per-request interval and
//! distance constraints. Only the most restrictive ("foremost") request
//! per provider is ever pushed to the client; this module persists the
//! active rows and reconciles every change, emitting a [`LocationEvent`]
//! only when the client-visible subscription actually has to change.

use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};
use vphone_types::location::valid_provider;
use vphone_types::{LocationEvent, LocationSubscription};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Persistence boundary for subscription rows.
///
/// One row per active request, keyed by `(provider, interval, distance)`.
/// Duplicate rows are legal: two host components may hold identical
/// requests and must be released independently.
pub trait SubscriptionStore: Send + Sync {
    fn insert(&self, subscription: &LocationSubscription) -> Result<(), StoreError>;

    /// Delete one row matching the subscription. Returns whether a row
    /// was deleted.
    fn remove(&self, subscription: &LocationSubscription) -> Result<bool, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    /// Componentwise minimum of interval and distance across the
    /// provider's rows; `None` when the provider has no rows.
    fn foremost(&self, provider: &str) -> Result<Option<LocationSubscription>, StoreError>;
}

/// In-memory store. Real deployments wire a persistent adapter at startup;
/// the reconciliation rules are identical either way.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<LocationSubscription>>,
}

impl SubscriptionStore for MemoryStore {
    fn insert(&self, subscription: &LocationSubscription) -> Result<(), StoreError> {
        self.rows.lock().unwrap().push(subscription.clone());
        Ok(())
    }

    fn remove(&self, subscription: &LocationSubscription) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter().position(|row| row == subscription) {
            Some(index) => {
                rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }

    fn foremost(&self, provider: &str) -> Result<Option<LocationSubscription>, StoreError> {
        let rows = self.rows.lock().unwrap();
        let mut foremost: Option<LocationSubscription> = None;
        for row in rows.iter().filter(|row| row.provider == provider) {
            foremost = Some(match foremost {
                Some(current) => current.merge(row),
                None => row.clone(),
            });
        }
        Ok(foremost)
    }
}

/// Serializes reconciliation and decides which changes the client must see.
pub struct SubscriptionLedger {
    store: Box<dyn SubscriptionStore>,
    // One critical section for all providers; contention is a handful of
    // broadcasts per minute.
    guard: Mutex<()>,
}

impl SubscriptionLedger {
    pub fn new(store: Box<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            guard: Mutex::new(()),
        }
    }

    /// Fresh-start reset: drop every persisted row.
    pub fn reset(&self) {
        let _guard = self.guard.lock().unwrap();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear subscription rows");
        }
    }

    /// The current foremost subscription for a provider, if any.
    pub fn foremost(&self, provider: &str) -> Option<LocationSubscription> {
        let _guard = self.guard.lock().unwrap();
        self.store.foremost(provider).unwrap_or_else(|e| {
            warn!(error = %e, provider, "foremost query failed");
            None
        })
    }

    /// Reconcile a new request.
    ///
    /// Persists the row (unless single-shot), then reports a subscribe
    /// event only if the request is more eager than the prior foremost in
    /// at least one dimension. The emitted values are the merge of the new
    /// request with the prior foremost, so the client is never asked to
    /// loosen a constraint that another row still holds.
    pub fn subscribe(
        &self,
        request: LocationSubscription,
        single_shot: bool,
    ) -> Option<LocationEvent> {
        if !valid_provider(&request.provider) {
            debug!(provider = %request.provider, "ignoring subscribe for invalid provider");
            return None;
        }

        let _guard = self.guard.lock().unwrap();

        let foremost = self
            .store
            .foremost(&request.provider)
            .unwrap_or_else(|e| {
                warn!(error = %e, provider = %request.provider, "foremost query failed");
                None
            });

        if !single_shot {
            if let Err(e) = self.store.insert(&request) {
                warn!(error = %e, provider = %request.provider, "failed to persist subscription");
            }
        }

        match foremost {
            Some(foremost) if foremost.satisfies(&request) => None,
            Some(foremost) if !single_shot => Some(LocationEvent::Subscribe {
                subscription: request.merge(&foremost),
                single_shot: false,
            }),
            _ => Some(LocationEvent::Subscribe {
                subscription: request,
                single_shot,
            }),
        }
    }

    /// Reconcile a released request.
    ///
    /// Deleting a row that does not exist is a no-op. When the last row
    /// for a provider goes away, an unsubscribe event is reported; when
    /// the foremost values visibly loosen, a subscribe event with the new
    /// foremost is reported so the client can back off.
    pub fn unsubscribe(&self, request: &LocationSubscription) -> Option<LocationEvent> {
        if !valid_provider(&request.provider) {
            return None;
        }

        let _guard = self.guard.lock().unwrap();

        match self.store.remove(request) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!(error = %e, provider = %request.provider, "failed to delete subscription");
                return None;
            }
        }

        let foremost = self.store.foremost(&request.provider).unwrap_or_else(|e| {
            warn!(error = %e, provider = %request.provider, "foremost query failed");
            None
        });

        match foremost {
            None => Some(LocationEvent::Unsubscribe {
                provider: request.provider.clone(),
            }),
            Some(foremost)
                if foremost.min_interval_ms > request.min_interval_ms
                    || foremost.min_distance_m > request.min_distance_m =>
            {
                Some(LocationEvent::Subscribe {
                    subscription: foremost,
                    single_shot: false,
                })
            }
            Some(_) => None,
        }
    }
}
