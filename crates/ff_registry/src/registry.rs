//! The namespace registry: the mutable shell around an otherwise-immutable
//! [`ConfigurationView`].
//!
//! Mutation points (`load`, `rollback`, `disable_all`/`enable_all`,
//! `set_override`/`clear_override`, `set_hooks`) are the only operations that
//! need serialization; evaluation itself holds no locks beyond the single
//! read needed to pin the view for the duration of one call. No `arc-swap` —
//! this crate sticks to `std::sync` primitives the way the rest of the stack
//! does, trading a cheap `RwLock` read for a dependency.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use ff_core::flagdef::{ConfigurationView, FlagDefinition};
use ff_core::ids::FeatureId;
use ff_core::value::Value;
use thiserror::Error;

use crate::hooks::{Hooks, LoadMetric, RollbackMetric};

/// History keeps at least this many prior views (capacity is
/// implementation-defined, >= 8).
pub const MIN_HISTORY_CAPACITY: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("flag not found: {0}")]
    FlagNotFound(FeatureId),
    #[error("feature '{0}' is not declared in this namespace")]
    UndeclaredFeature(FeatureId),
}

pub struct NamespaceRegistry {
    namespace_id: String,
    history_capacity: usize,
    declared: RwLock<BTreeSet<FeatureId>>,
    view: RwLock<Arc<ConfigurationView>>,
    history: Mutex<VecDeque<Arc<ConfigurationView>>>,
    overrides: RwLock<BTreeMap<FeatureId, Value>>,
    enabled: AtomicBool,
    hooks: RwLock<Hooks>,
}

impl NamespaceRegistry {
    pub fn new(namespace_id: impl Into<String>) -> Self {
        NamespaceRegistry {
            namespace_id: namespace_id.into(),
            history_capacity: MIN_HISTORY_CAPACITY,
            declared: RwLock::new(BTreeSet::new()),
            view: RwLock::new(Arc::new(ConfigurationView::empty())),
            history: Mutex::new(VecDeque::new()),
            overrides: RwLock::new(BTreeMap::new()),
            enabled: AtomicBool::new(true),
            hooks: RwLock::new(Hooks::default()),
        }
    }

    pub fn namespace_id(&self) -> &str {
        &self.namespace_id
    }

    /// Declares a feature as belonging to this namespace. Hosts call this once
    /// per `Feature<T>` at startup, independent of any loaded configuration.
    pub fn register_feature(&self, feature: FeatureId) {
        self.declared.write().expect("declared lock poisoned").insert(feature);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn disable_all(&self) {
        self.enabled.store(false, Ordering::Release);
        let namespace_id = &self.namespace_id;
        self.with_hooks(|hooks| hooks.logger.info(&|| format!("namespace '{namespace_id}' disabled: all evaluations now return defaults")));
    }

    pub fn enable_all(&self) {
        self.enabled.store(true, Ordering::Release);
        let namespace_id = &self.namespace_id;
        self.with_hooks(|hooks| hooks.logger.info(&|| format!("namespace '{namespace_id}' enabled")));
    }

    /// The view pinned for the duration of one evaluation. Cloning the `Arc`
    /// is the only synchronization a reader pays.
    pub fn current_view(&self) -> Arc<ConfigurationView> {
        self.view.read().expect("view lock poisoned").clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().expect("history lock poisoned").len()
    }

    pub fn set_hooks(&self, hooks: Hooks) {
        let namespace_id = &self.namespace_id;
        self.with_hooks(|old| old.logger.info(&|| format!("namespace '{namespace_id}' installed new logger/metrics hooks")));
        *self.hooks.write().expect("hooks lock poisoned") = hooks;
    }

    pub(crate) fn with_hooks<R>(&self, f: impl FnOnce(&Hooks) -> R) -> R {
        f(&self.hooks.read().expect("hooks lock poisoned"))
    }

    /// Override-aware lookup: fails with `FlagNotFound` if the feature was
    /// never declared or never appeared in a loaded configuration.
    pub fn flag(&self, feature: &FeatureId) -> Result<FlagDefinition, RegistryError> {
        self.find_flag(feature).ok_or_else(|| RegistryError::FlagNotFound(feature.clone()))
    }

    pub fn find_flag(&self, feature: &FeatureId) -> Option<FlagDefinition> {
        let view = self.current_view();
        let mut def = view.get(feature)?.clone();
        if let Some(value) = self.overrides.read().expect("overrides lock poisoned").get(feature) {
            def.r#override = Some(value.clone());
        }
        Some(def)
    }

    /// Installs a per-feature override. Survives subsequent `load` calls;
    /// only `clear_override` removes it.
    pub fn set_override(&self, feature: FeatureId, value: Value) {
        self.with_hooks(|hooks| hooks.logger.info(&|| format!("override set for '{feature}' = {value:?}")));
        self.overrides.write().expect("overrides lock poisoned").insert(feature, value);
    }

    pub fn clear_override(&self, feature: &FeatureId) {
        self.with_hooks(|hooks| hooks.logger.info(&|| format!("override cleared for '{feature}'")));
        self.overrides.write().expect("overrides lock poisoned").remove(feature);
    }

    /// Atomically installs `config`. Every feature key in `config` must
    /// already be declared via [`register_feature`]; a failed load leaves the
    /// current view untouched.
    pub fn load(&self, config: ConfigurationView) -> Result<(), RegistryError> {
        {
            let declared = self.declared.read().expect("declared lock poisoned");
            for feature in config.flags.keys() {
                if !declared.contains(feature) {
                    return Err(RegistryError::UndeclaredFeature(feature.clone()));
                }
            }
        }

        let flag_count = config.flags.len();
        let config_version = config.metadata.version.clone();
        let incoming = Arc::new(config);

        {
            let mut view = self.view.write().expect("view lock poisoned");
            let mut history = self.history.lock().expect("history lock poisoned");
            history.push_back(view.clone());
            while history.len() > self.history_capacity {
                history.pop_front();
            }
            *view = incoming;
        }

        self.with_hooks(|hooks| {
            hooks.logger.info(&|| {
                format!(
                    "loaded configuration for namespace '{}' ({flag_count} flags, version {config_version:?})",
                    self.namespace_id
                )
            });
            hooks.metrics.record_config_load(&LoadMetric {
                namespace_id: self.namespace_id.clone(),
                config_version,
                flag_count,
            });
        });
        Ok(())
    }

    /// Pops `k` history entries and swaps in the resulting view. `false` (no
    /// mutation) if `k` exceeds the history depth.
    pub fn rollback(&self, k: usize) -> bool {
        if k == 0 {
            return true;
        }
        let target = {
            let mut history = self.history.lock().expect("history lock poisoned");
            if k > history.len() {
                None
            } else {
                let mut popped = None;
                for _ in 0..k {
                    popped = history.pop_back();
                }
                popped
            }
        };

        let succeeded = target.is_some();
        if let Some(view) = target {
            *self.view.write().expect("view lock poisoned") = view;
        }

        self.with_hooks(|hooks| {
            if succeeded {
                hooks.logger.info(&|| format!("rolled back namespace '{}' by {k} step(s)", self.namespace_id));
            } else {
                hooks.logger.warn(
                    &|| format!("rollback of {k} step(s) failed for namespace '{}': history depth exceeded", self.namespace_id),
                    None,
                );
            }
            hooks.metrics.record_config_rollback(&RollbackMetric {
                namespace_id: self.namespace_id.clone(),
                popped: k,
                succeeded,
            });
        });
        succeeded
    }
}
