//! ff_registry — the namespace registry and evaluator: the only crate in the
//! stack that holds mutable, shared state.

pub mod evaluator;
pub mod hooks;
pub mod registry;

pub use evaluator::{evaluate, evaluate_explain, Decision, EvaluationError, EvaluationResult};
pub use hooks::{DecisionKind, Evaluation, EvaluationMode, Hooks, Logger, LoadMetric, MetricsCollector, NoopMetricsCollector, RollbackMetric, TracingLogger};
pub use registry::{NamespaceRegistry, RegistryError, MIN_HISTORY_CAPACITY};
