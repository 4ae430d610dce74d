//! Prompt rendering for the specialist model calls.
//!
//! Deterministic string templates. The wording is not load-bearing; what
//! matters is that every statistic (or the full patient record) reaches
//! the model verbatim.

use crate::models::{PatientRecord, SpecialtyProfile, Statistics};
use serde_json::Value;
use std::collections::BTreeMap;

/// Render the analysis request for one health specialty.
pub fn build_analysis_prompt(
    profile: &SpecialtyProfile,
    stats: &BTreeMap<String, Statistics>,
) -> String {
    format!(
        "Analyze the following data for {role}:\n{stats}\nProvide key patterns and actionable insights.",
        role = profile.role_description,
        stats = serde_json::to_string_pretty(stats).unwrap_or_default(),
    )
}

/// Render the assessment request for one waiting-list specialist.
///
/// The same prompt goes to every specialist; only the system role differs.
pub fn build_triage_prompt(patient: &PatientRecord, health_trends: &Value) -> String {
    format!(
        "Analyze the following patient data:\n\
         Patient Information:\n{patient}\n\n\
         Health Trends:\n{trends}\n\n\
         Consider:\n\
         1. Current wait time vs target for specialty\n\
         2. Health deterioration patterns\n\
         3. Clinical urgency indicators\n\
         4. NHS guidelines compliance\n\n\
         Provide:\n\
         1. Recommended priority level (Routine/Urgent/Cancer/Two Week Wait)\n\
         2. Reasoning for recommendation\n\
         3. Risk assessment\n\
         4. Required actions",
        patient = serde_json::to_string_pretty(patient).unwrap_or_default(),
        trends = serde_json::to_string_pretty(health_trends).unwrap_or_default(),
    )
}
