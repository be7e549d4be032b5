//! Run summaries and deployment reports
//!
//! The summarizer builds a single structured report from terminal job
//! outputs. Missing or malformed values surface as explicit
//! `"unavailable"` markers so the report shape stays constant under
//! partial failure; malformed numerics additionally record a
//! data-quality error, which never fails the run.

use super::errors::DataQualityError;
use super::run::RunReport;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a summary field reads its value from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySource {
    /// Job spec name
    pub job: String,
    /// Declared output key
    pub key: String,
}

impl SummarySource {
    /// Creates a source from a job name and output key
    pub fn new(job: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            key: key.into(),
        }
    }
}

/// Declares which job outputs feed each summary field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummarySpec {
    /// Source of the branch image reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<SummarySource>,

    /// Source of the coverage percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<SummarySource>,

    /// Source of the total test count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_total: Option<SummarySource>,

    /// Sources of artifact links, in report order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub artifact_links: Vec<SummarySource>,

    /// Link to the run itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_link: Option<String>,
}

impl SummarySpec {
    /// Creates an empty summary spec
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the image reference source
    #[must_use]
    pub fn image_ref_from(mut self, job: impl Into<String>, key: impl Into<String>) -> Self {
        self.image_ref = Some(SummarySource::new(job, key));
        self
    }

    /// Sets the coverage source
    #[must_use]
    pub fn coverage_from(mut self, job: impl Into<String>, key: impl Into<String>) -> Self {
        self.coverage = Some(SummarySource::new(job, key));
        self
    }

    /// Sets the test total source
    #[must_use]
    pub fn test_total_from(mut self, job: impl Into<String>, key: impl Into<String>) -> Self {
        self.test_total = Some(SummarySource::new(job, key));
        self
    }

    /// Adds an artifact link source
    #[must_use]
    pub fn artifact_link_from(mut self, job: impl Into<String>, key: impl Into<String>) -> Self {
        self.artifact_links.push(SummarySource::new(job, key));
        self
    }

    /// Sets the run link
    #[must_use]
    pub fn with_run_link(mut self, link: impl Into<String>) -> Self {
        self.run_link = Some(link.into());
        self
    }
}

/// A summary field that is either available or explicitly marked not
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryValue<T> {
    /// The value was captured and parsed
    Available(T),
    /// The value is missing or malformed
    Unavailable,
}

impl<T> SummaryValue<T> {
    /// Returns true if a value is present
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Borrows the value, if present
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable => None,
        }
    }
}

impl<T: Serialize> Serialize for SummaryValue<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Available(v) => v.serialize(serializer),
            Self::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

impl<T: fmt::Display> fmt::Display for SummaryValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(v) => write!(f, "{v}"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Aggregated, read-only view of a terminal run
///
/// Built once from job outputs; immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    #[serde(rename = "imageRefBranch")]
    image_ref_branch: SummaryValue<String>,

    #[serde(rename = "coveragePercent")]
    coverage_percent: SummaryValue<f64>,

    #[serde(rename = "testTotal")]
    test_total: SummaryValue<u64>,

    #[serde(rename = "artifactLinks")]
    artifact_links: Vec<String>,

    #[serde(rename = "runLink")]
    run_link: SummaryValue<String>,

    #[serde(skip)]
    data_quality: Vec<DataQualityError>,
}

impl RunSummary {
    /// Builds a summary from a terminal run report.
    ///
    /// Pulls exactly the declared sources; anything missing becomes an
    /// explicit unavailable marker, and malformed numerics also record
    /// a [`DataQualityError`].
    #[must_use]
    pub fn build(report: &RunReport, spec: &SummarySpec) -> Self {
        let mut data_quality = Vec::new();

        let image_ref_branch = match fetch(report, spec.image_ref.as_ref()) {
            Some(raw) => SummaryValue::Available(raw),
            None => SummaryValue::Unavailable,
        };

        let coverage_percent = parse_numeric::<f64>(
            fetch(report, spec.coverage.as_ref()),
            "coveragePercent",
            &mut data_quality,
        );

        let test_total = parse_numeric::<u64>(
            fetch(report, spec.test_total.as_ref()),
            "testTotal",
            &mut data_quality,
        );

        let artifact_links = spec
            .artifact_links
            .iter()
            .map(|source| {
                fetch(report, Some(source)).unwrap_or_else(|| "unavailable".to_string())
            })
            .collect();

        let run_link = match spec.run_link.clone() {
            Some(link) => SummaryValue::Available(link),
            None => SummaryValue::Unavailable,
        };

        Self {
            image_ref_branch,
            coverage_percent,
            test_total,
            artifact_links,
            run_link,
            data_quality,
        }
    }

    /// Branch image reference
    #[must_use]
    pub fn image_ref_branch(&self) -> &SummaryValue<String> {
        &self.image_ref_branch
    }

    /// Coverage percentage
    #[must_use]
    pub fn coverage_percent(&self) -> &SummaryValue<f64> {
        &self.coverage_percent
    }

    /// Total test count
    #[must_use]
    pub fn test_total(&self) -> &SummaryValue<u64> {
        &self.test_total
    }

    /// Artifact links, `"unavailable"` entries included
    #[must_use]
    pub fn artifact_links(&self) -> &[String] {
        &self.artifact_links
    }

    /// Link to the run
    #[must_use]
    pub fn run_link(&self) -> &SummaryValue<String> {
        &self.run_link
    }

    /// Data-quality errors collected while building
    #[must_use]
    pub fn data_quality(&self) -> &[DataQualityError] {
        &self.data_quality
    }
}

fn fetch(report: &RunReport, source: Option<&SummarySource>) -> Option<String> {
    let source = source?;
    match report.output(&source.job, &source.key) {
        Some(value) => Some(value.to_string()),
        None => {
            tracing::warn!(
                job = %source.job,
                key = %source.key,
                "Summary source unavailable"
            );
            None
        }
    }
}

fn parse_numeric<T: std::str::FromStr>(
    raw: Option<String>,
    field: &str,
    data_quality: &mut Vec<DataQualityError>,
) -> SummaryValue<T> {
    match raw {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => SummaryValue::Available(value),
            Err(_) => {
                data_quality.push(DataQualityError {
                    field: field.to_string(),
                    value: raw,
                    expected: "number".to_string(),
                });
                SummaryValue::Unavailable
            }
        },
        None => SummaryValue::Unavailable,
    }
}

/// Result of a deployment-simulation firing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentReport {
    /// The tag that was actually pulled
    #[serde(rename = "tagUsed")]
    pub tag_used: String,

    /// Whether resolution fell back to the commit tag
    #[serde(rename = "fallbackApplied")]
    pub fallback_applied: bool,

    /// Output captured from the deployment-simulation step
    #[serde(rename = "deploymentOutput")]
    pub deployment_output: SummaryValue<String>,

    /// Whether the simulation step succeeded
    pub success: bool,
}
