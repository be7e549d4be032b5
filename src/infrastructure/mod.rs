//! Infrastructure layer: config, logging, metrics and boundary
//! implementations

pub mod config;
pub mod logging;
pub mod metrics;
pub mod notifier;
pub mod store;

pub use config::RegistryConfig;
pub use logging::init_logging;
pub use metrics::{MetricsCollector, RunMetrics};
pub use notifier::{HttpNotifier, LogNotifier};
pub use store::InMemoryStore;
