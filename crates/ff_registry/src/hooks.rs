//! Observability hooks: metrics and logging, both with no-op defaults so a
//! host that doesn't care about either pays nothing beyond a trait call.

use std::time::Duration;

/// Which branch of the evaluator produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    RegistryDisabled,
    Inactive,
    Rule,
    Default,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub namespace_id: String,
    pub feature_key: String,
    pub mode: EvaluationMode,
    pub duration: Duration,
    pub decision_kind: DecisionKind,
    pub config_version: Option<String>,
    pub bucket: Option<u32>,
    pub matched_rule_specificity: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    Normal,
    Explain,
}

#[derive(Debug, Clone)]
pub struct LoadMetric {
    pub namespace_id: String,
    pub config_version: Option<String>,
    pub flag_count: usize,
}

#[derive(Debug, Clone)]
pub struct RollbackMetric {
    pub namespace_id: String,
    pub popped: usize,
    pub succeeded: bool,
}

/// Host-supplied metrics sink. Every method has a no-op default so a host
/// implementing only one event type doesn't have to stub the others.
pub trait MetricsCollector: Send + Sync {
    fn record_evaluation(&self, _event: &Evaluation) {}
    fn record_config_load(&self, _event: &LoadMetric) {}
    fn record_config_rollback(&self, _event: &RollbackMetric) {}
}

/// A `MetricsCollector` that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsCollector;

impl MetricsCollector for NoopMetricsCollector {}

/// Host-supplied logger. Messages are thunks so a host can elide formatting
/// work at a suppressed level.
pub trait Logger: Send + Sync {
    fn debug(&self, _message: &dyn Fn() -> String) {}
    fn info(&self, _message: &dyn Fn() -> String) {}
    fn warn(&self, _message: &dyn Fn() -> String, _throwable: Option<&str>) {}
    fn error(&self, _message: &dyn Fn() -> String, _throwable: Option<&str>) {}
}

/// The default logger: forwards to `tracing` at matching levels.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &dyn Fn() -> String) {
        tracing::debug!("{}", message());
    }
    fn info(&self, message: &dyn Fn() -> String) {
        tracing::info!("{}", message());
    }
    fn warn(&self, message: &dyn Fn() -> String, throwable: Option<&str>) {
        match throwable {
            Some(t) => tracing::warn!(error = t, "{}", message()),
            None => tracing::warn!("{}", message()),
        }
    }
    fn error(&self, message: &dyn Fn() -> String, throwable: Option<&str>) {
        match throwable {
            Some(t) => tracing::error!(error = t, "{}", message()),
            None => tracing::error!("{}", message()),
        }
    }
}

/// The replaceable pair of hooks a [`crate::registry::NamespaceRegistry`]
/// invokes from the caller's thread with no additional synchronization.
pub struct Hooks {
    pub logger: Box<dyn Logger>,
    pub metrics: Box<dyn MetricsCollector>,
}

impl Default for Hooks {
    fn default() -> Self {
        Hooks { logger: Box::new(TracingLogger), metrics: Box::new(NoopMetricsCollector) }
    }
}
