//! Health-analysis coordination.

use crate::analysis::{build_analysis_prompt, compute_statistics, extract_comments};
use crate::gateway::{ChatModel, GatewayError};
use crate::models::{
    AgentResult, AnalysisReport, GroupedRecords, SpecialtyFindings, SpecialtyProfile,
};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fans one model call out per specialist profile and merges the parsed
/// replies into an [`AnalysisReport`].
pub struct HealthCoordinator<'a, M: ChatModel> {
    profiles: &'a [SpecialtyProfile],
    model: &'a M,
}

impl<'a, M: ChatModel> HealthCoordinator<'a, M> {
    pub fn new(profiles: &'a [SpecialtyProfile], model: &'a M) -> Self {
        Self { profiles, model }
    }

    /// Run every specialist against `context` concurrently and build the
    /// merged report.
    ///
    /// All calls are launched before any is awaited; one failed call fails
    /// the whole run, since the summary is only meaningful when every
    /// specialty is covered.
    pub async fn run_analyses(&self, context: &GroupedRecords) -> Result<AnalysisReport, GatewayError> {
        info!("Running {} specialist analyses", self.profiles.len());

        let results = try_join_all(
            self.profiles
                .iter()
                .map(|profile| self.run_agent(profile, context)),
        )
        .await?;

        let summary = generate_summary(&results);
        Ok(AnalysisReport {
            per_specialty: format_results(results),
            summary,
        })
    }

    async fn run_agent(
        &self,
        profile: &SpecialtyProfile,
        context: &GroupedRecords,
    ) -> Result<AgentResult, GatewayError> {
        let metrics = extract_metrics(profile, context);
        let statistics = compute_statistics(&metrics);
        let prompt = build_analysis_prompt(profile, &statistics);

        debug!("Dispatching {} agent", profile.name);
        let raw_text = match self.model.generate(&profile.role_description, &prompt).await {
            Ok(text) => text,
            // An empty reply degrades to the parse-miss path instead of
            // failing the run.
            Err(GatewayError::EmptyContent) => String::new(),
            Err(e) => return Err(e),
        };

        Ok(AgentResult {
            specialty: profile.name.clone(),
            raw_text,
            statistics,
        })
    }
}

/// Slice the working context down to the metric groups a profile consumes.
/// Keys absent from the context are omitted, not zero-filled.
fn extract_metrics(profile: &SpecialtyProfile, context: &GroupedRecords) -> GroupedRecords {
    profile
        .metric_keys
        .iter()
        .filter_map(|key| context.get(key).map(|records| (key.clone(), records.clone())))
        .collect()
}

fn format_results(results: Vec<AgentResult>) -> BTreeMap<String, SpecialtyFindings> {
    results
        .into_iter()
        .map(|result| {
            let comments = extract_comments(&result.raw_text);
            (
                result.specialty,
                SpecialtyFindings {
                    statistics: result.statistics,
                    comments,
                },
            )
        })
        .collect()
}

fn generate_summary(results: &[AgentResult]) -> String {
    format!(
        "Overall, your health metrics show stable patterns. {} categories were analyzed, \
         with recommendations for improvement where needed.",
        results.len()
    )
}
