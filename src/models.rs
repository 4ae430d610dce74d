//! Data models shared across the analyzer.
//!
//! This module contains the core data structures used throughout
//! the application for representing metric records, statistics,
//! specialist profiles, and analysis outputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Metric groups keyed by metric name, in deterministic key order.
pub type GroupedRecords = BTreeMap<String, Vec<MetricRecord>>;

/// Raw value carried by a health export row.
///
/// Exports mix numeric readings (heart rate, respiratory rate) with
/// categorical strings (sleep stages), so the value stays untyped until
/// the statistics pass coerces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    /// Coerce to a float. Non-numeric text yields `None` and is dropped
    /// from aggregates rather than raising an error.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Parse a raw export field, preferring the numeric form.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) => MetricValue::Number(n),
            Err(_) => MetricValue::Text(raw.to_string()),
        }
    }
}

/// A single observation from a health export.
///
/// Immutable once produced by the import adapter. Records are grouped by
/// metric name in ingestion order, which is not necessarily chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub value: MetricValue,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
}

/// Summary statistics for one metric group.
///
/// `average` and `total` are fixed two-decimal strings so they survive
/// serialization into prompts and reports verbatim; `min` and `max` stay
/// raw numbers. An empty numeric set yields the uniform zero placeholder
/// from [`Statistics::zero`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub average: String,
    pub min: f64,
    pub max: f64,
    pub total: String,
}

impl Statistics {
    /// Placeholder emitted when a metric group has no numeric values.
    pub fn zero() -> Self {
        Self {
            average: "0.00".to_string(),
            min: 0.0,
            max: 0.0,
            total: "0.00".to_string(),
        }
    }
}

/// A named analytical role bound to a fixed subset of metric keys.
///
/// Profiles are static configuration injected at coordinator construction
/// time, never module-level shared state, so tests can substitute
/// synthetic profiles.
#[derive(Debug, Clone)]
pub struct SpecialtyProfile {
    /// Short uppercase identifier used as the report key (e.g. "CARDIAC").
    pub name: String,
    /// Role description framing the model call.
    pub role_description: String,
    /// Metric groups this specialty consumes, drawn from the import
    /// adapter's closed vocabulary.
    pub metric_keys: Vec<String>,
}

impl SpecialtyProfile {
    pub fn new(name: &str, role_description: &str, metric_keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            role_description: role_description.to_string(),
            metric_keys: metric_keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Output of one specialist model call plus its computed statistics.
/// Ephemeral; lives only for the duration of one coordination pass.
#[derive(Debug, Clone)]
pub struct AgentResult {
    pub specialty: String,
    pub raw_text: String,
    pub statistics: BTreeMap<String, Statistics>,
}

/// One specialty's slice of the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyFindings {
    pub statistics: BTreeMap<String, Statistics>,
    pub comments: Vec<String>,
}

/// The merged health-analysis report returned by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(rename = "analysisResults")]
    pub per_specialty: BTreeMap<String, SpecialtyFindings>,
    pub summary: String,
}

/// Metadata attached to a rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time of the analysis.
    pub analysis_date: chrono::DateTime<chrono::Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    /// Number of specialty categories analyzed.
    pub categories_analyzed: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// Waiting-list priority on the fixed ordinal scale.
///
/// Declaration order is the urgency order, so `Ord` picks the most urgent
/// recommendation among multiple agent opinions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Routine,
    Urgent,
    Cancer,
    #[serde(rename = "Two Week Wait")]
    TwoWeekWait,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Routine => write!(f, "Routine"),
            Priority::Urgent => write!(f, "Urgent"),
            Priority::Cancer => write!(f, "Cancer"),
            Priority::TwoWeekWait => write!(f, "Two Week Wait"),
        }
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "routine" => Ok(Priority::Routine),
            "urgent" => Ok(Priority::Urgent),
            "cancer" => Ok(Priority::Cancer),
            "two week wait" => Ok(Priority::TwoWeekWait),
            _ => Err(()),
        }
    }
}

/// Qualitative risk level synthesized from the specialist opinions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// The synthesized outcome of one waiting-list assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityDecision {
    pub recommended_priority: Priority,
    pub reasoning: String,
    pub risk_level: RiskLevel,
    pub action_needed: String,
}

/// One patient row from the waiting-list JSON file.
///
/// Only the identifier and recorded priority are interpreted; every other
/// field is carried through verbatim so the specialist prompts see the
/// full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Patient_ID")]
    pub patient_id: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// The waiting-list input file layout.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitingList {
    pub waiting_list_data: Vec<PatientRecord>,
}

/// One row of the batch assessment output.
#[derive(Debug, Clone, Serialize)]
pub struct PriorityAssessment {
    #[serde(rename = "Patient_ID")]
    pub patient_id: String,
    pub current_priority: String,
    pub recommended_priority: Priority,
    pub change_required: bool,
    pub reasoning: String,
    pub risk_level: RiskLevel,
    pub action_needed: String,
}
