//! Metrics collection
//!
//! Observational per-run metrics; never feed back into scheduling.

use crate::pipeline::RunReport;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Metrics for one pipeline run
#[derive(Debug, Clone)]
pub struct RunMetrics {
    /// Run identifier
    pub run_id: String,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Number of job instances
    pub total_jobs: usize,

    /// Number of succeeded instances
    pub succeeded: usize,

    /// Number of failed instances
    pub failed: usize,

    /// Number of skipped instances
    pub skipped: usize,
}

impl RunMetrics {
    /// Derives metrics from a terminal run report
    #[must_use]
    pub fn from_report(report: &RunReport, duration: Duration) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            duration,
            total_jobs: report.instances.len(),
            succeeded: report
                .instances
                .iter()
                .filter(|i| i.status.is_succeeded())
                .count(),
            failed: report.instances.iter().filter(|i| i.status.is_failed()).count(),
            skipped: report
                .instances
                .iter()
                .filter(|i| i.status.is_skipped())
                .count(),
        }
    }
}

/// Metrics collector for pipeline runs
pub struct MetricsCollector {
    /// Collected metrics keyed by run id
    metrics: Arc<RwLock<HashMap<String, RunMetrics>>>,
}

impl MetricsCollector {
    /// Creates a new metrics collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records metrics for a run
    #[allow(clippy::missing_panics_doc)]
    pub fn record(&self, metrics: RunMetrics) {
        let mut map = self.metrics.write().unwrap();
        map.insert(metrics.run_id.clone(), metrics);
    }

    /// Gets metrics for a specific run
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn get(&self, run_id: &str) -> Option<RunMetrics> {
        let map = self.metrics.read().unwrap();
        map.get(run_id).cloned()
    }

    /// Gets all recorded metrics
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn get_all(&self) -> Vec<RunMetrics> {
        let map = self.metrics.read().unwrap();
        map.values().cloned().collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{InstanceReport, JobStatus, RunStatus};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn report() -> RunReport {
        let instance = |id: &str, status: JobStatus| InstanceReport {
            id: id.to_string(),
            spec: id.to_string(),
            axes: vec![],
            status,
            failure: None,
            outputs: BTreeMap::new(),
            duration: None,
        };
        RunReport {
            run_id: Uuid::new_v4(),
            status: RunStatus::Failed,
            instances: vec![
                instance("a", JobStatus::Succeeded),
                instance("b", JobStatus::Failed),
                instance("c", JobStatus::Skipped),
            ],
        }
    }

    #[test]
    fn test_metrics_from_report() {
        let metrics = RunMetrics::from_report(&report(), Duration::from_secs(10));
        assert_eq!(metrics.total_jobs, 3);
        assert_eq!(metrics.succeeded, 1);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.skipped, 1);
    }

    #[test]
    fn test_collector_record_and_get() {
        let collector = MetricsCollector::new();
        assert!(collector.get_all().is_empty());

        let metrics = RunMetrics::from_report(&report(), Duration::from_secs(10));
        let run_id = metrics.run_id.clone();
        collector.record(metrics);

        let retrieved = collector.get(&run_id).unwrap();
        assert_eq!(retrieved.total_jobs, 3);
        assert!(collector.get("missing").is_none());
    }
}
