//! One breaker per downstream dependency.
//!
//! # Responsibilities
//! - Lazily create breakers by name, exactly once per name
//! - Resolve the policy for new breakers (explicit > per-service > default)
//! - Aggregate snapshots and bulk reset for the admin surface
//!
//! The registry is an ordinary value: construct one and pass it (usually as
//! `Arc<BreakerRegistry>`) to whatever needs it. There is no global instance.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::schema::BreakerSettings;
use crate::config::validation::ValidationError;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::policy::Policy;
use crate::resilience::stats::BreakerSnapshot;

/// Policies applied to breakers when they are first created.
#[derive(Debug, Clone, Default)]
struct Policies {
    default: Policy,
    overrides: HashMap<String, Policy>,
}

/// Keyed collection of circuit breakers.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    policies: ArcSwap<Policies>,
}

impl BreakerRegistry {
    /// Create an empty registry using `default_policy` for new breakers.
    pub fn new(default_policy: Policy) -> Self {
        Self::with_overrides(default_policy, HashMap::new())
    }

    /// Create an empty registry with per-service policy overrides.
    pub fn with_overrides(default_policy: Policy, overrides: HashMap<String, Policy>) -> Self {
        Self {
            breakers: DashMap::new(),
            policies: ArcSwap::from_pointee(Policies {
                default: default_policy,
                overrides,
            }),
        }
    }

    /// Build a registry from the `[breaker]` configuration section.
    pub fn from_settings(settings: &BreakerSettings) -> Result<Self, Vec<ValidationError>> {
        let (default, overrides) = settings.to_policies()?;
        Ok(Self::with_overrides(default, overrides))
    }

    /// Return the breaker for `name`, creating it on first use.
    ///
    /// New breakers take the configured override for `name` if there is one,
    /// otherwise the default policy.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.value().clone();
        }
        let policies = self.policies.load();
        let policy = policies
            .overrides
            .get(name)
            .unwrap_or(&policies.default)
            .clone();
        self.insert_if_absent(name, policy)
    }

    /// Return the breaker for `name`, creating it with `policy` if absent.
    ///
    /// An existing breaker keeps its original policy.
    pub fn get_with(&self, name: &str, policy: Policy) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            if existing.policy() != &policy {
                tracing::debug!(
                    circuit_breaker = %name,
                    "Breaker already exists, ignoring requested policy"
                );
            }
            return existing.value().clone();
        }
        self.insert_if_absent(name, policy)
    }

    fn insert_if_absent(&self, name: &str, policy: Policy) -> Arc<CircuitBreaker> {
        // The entry holds the shard write lock, so racing first callers
        // all observe the same instance.
        let mut created = false;
        let breaker = self
            .breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(CircuitBreaker::new(name, policy))
            })
            .value()
            .clone();

        if created {
            metrics::record_registry_size(self.breakers.len());
            tracing::info!(
                circuit_breaker = %name,
                failure_threshold = breaker.policy().failure_threshold(),
                recovery_timeout_secs = breaker.policy().recovery_timeout().as_secs_f64(),
                success_threshold = breaker.policy().success_threshold(),
                min_volume = breaker.policy().min_volume(),
                "Circuit breaker registered"
            );
        }
        breaker
    }

    /// Look up a breaker without creating it.
    pub fn lookup(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    pub fn snapshot(&self, name: &str) -> Option<BreakerSnapshot> {
        self.lookup(name).map(|b| b.snapshot())
    }

    /// Snapshot of every registered breaker, keyed by name.
    pub fn all_snapshots(&self) -> BTreeMap<String, BreakerSnapshot> {
        self.all_breakers()
            .into_iter()
            .map(|b| (b.name().to_string(), b.snapshot()))
            .collect()
    }

    /// Reset one breaker. Returns false if `name` is not registered.
    pub fn reset(&self, name: &str) -> bool {
        match self.lookup(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    /// Reset every breaker to Closed with zeroed stats. Entries are kept.
    pub fn reset_all(&self) {
        let breakers = self.all_breakers();
        for breaker in &breakers {
            breaker.reset();
        }
        tracing::info!(count = breakers.len(), "All circuit breakers reset");
    }

    /// Replace the policies used for breakers created from now on.
    pub fn update_policies(&self, default: Policy, overrides: HashMap<String, Policy>) {
        let count = overrides.len();
        self.policies.store(Arc::new(Policies { default, overrides }));
        tracing::info!(overrides = count, "Breaker policies updated");
    }

    /// Policy a breaker named `name` would be created with right now.
    pub fn policy_for(&self, name: &str) -> Policy {
        let policies = self.policies.load();
        policies
            .overrides
            .get(name)
            .unwrap_or(&policies.default)
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Clone the breaker handles out so no map guard is held while the
    /// per-breaker locks are taken.
    fn all_breakers(&self) -> Vec<Arc<CircuitBreaker>> {
        self.breakers.iter().map(|r| r.value().clone()).collect()
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}
