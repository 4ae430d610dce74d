//! Waiting-list priority coordination.

use crate::analysis::{build_triage_prompt, extract_assessment};
use crate::gateway::{ChatModel, GatewayError};
use crate::models::{
    PatientRecord, Priority, PriorityAssessment, PriorityDecision, RiskLevel, SpecialtyProfile,
    WaitingList,
};
use futures::future::try_join_all;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Per-patient health-trend context, keyed by patient identifier.
pub type HealthTrends = HashMap<String, Value>;

/// Fans one assessment call out per triage specialist and synthesizes the
/// replies into a single [`PriorityDecision`].
pub struct TriageCoordinator<'a, M: ChatModel> {
    profiles: &'a [SpecialtyProfile],
    model: &'a M,
}

impl<'a, M: ChatModel> TriageCoordinator<'a, M> {
    pub fn new(profiles: &'a [SpecialtyProfile], model: &'a M) -> Self {
        Self { profiles, model }
    }

    /// Assess one patient: concurrent fan-out over the specialist roster,
    /// join-all with propagate-first-error, then priority synthesis in
    /// profile declaration order.
    pub async fn assess_patient(
        &self,
        patient: &PatientRecord,
        health_trends: &Value,
    ) -> Result<PriorityDecision, GatewayError> {
        debug!("Assessing patient {}", patient.patient_id);

        let replies = try_join_all(
            self.profiles
                .iter()
                .map(|profile| self.run_agent(profile, patient, health_trends)),
        )
        .await?;

        Ok(synthesize(&replies))
    }

    async fn run_agent(
        &self,
        profile: &SpecialtyProfile,
        patient: &PatientRecord,
        health_trends: &Value,
    ) -> Result<String, GatewayError> {
        let system_role = format!(
            "You are an {}. Analyze the patient data and recommend any priority changes needed.",
            profile.role_description
        );
        let prompt = build_triage_prompt(patient, health_trends);

        match self.model.generate(&system_role, &prompt).await {
            Ok(text) => Ok(text),
            // An empty reply contributes no fields to the synthesis.
            Err(GatewayError::EmptyContent) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Assess every patient on the waiting list sequentially, comparing
    /// the synthesized priority against the recorded one.
    ///
    /// Fails on the first patient whose assessment fails; callers write
    /// no partial output in that case.
    pub async fn process_batch(
        &self,
        waiting_list: &WaitingList,
        health_trends: &HealthTrends,
        show_progress: bool,
    ) -> Result<Vec<PriorityAssessment>, GatewayError> {
        let patients = &waiting_list.waiting_list_data;
        info!("Assessing {} waiting-list patients", patients.len());

        let bar = if show_progress {
            let bar = ProgressBar::new(patients.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} patients")
                    .expect("valid progress template"),
            );
            Some(bar)
        } else {
            None
        };

        let empty_trends = Value::Object(serde_json::Map::new());
        let mut results = Vec::with_capacity(patients.len());

        for patient in patients {
            let trends = health_trends.get(&patient.patient_id).unwrap_or(&empty_trends);
            let decision = self.assess_patient(patient, trends).await?;

            results.push(PriorityAssessment {
                patient_id: patient.patient_id.clone(),
                current_priority: patient.priority.clone(),
                change_required: patient.priority != decision.recommended_priority.to_string(),
                recommended_priority: decision.recommended_priority,
                reasoning: decision.reasoning,
                risk_level: decision.risk_level,
                action_needed: decision.action_needed,
            });

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        Ok(results)
    }
}

/// Reduce the specialist replies into one decision:
/// highest-ranked priority (default Routine), space-joined reasonings,
/// averaged-and-bucketed risk, and `"; "`-joined actions.
fn synthesize(replies: &[String]) -> PriorityDecision {
    let parsed: Vec<_> = replies.iter().map(|text| extract_assessment(text)).collect();

    let recommended_priority = parsed
        .iter()
        .filter_map(|p| p.priority)
        .max()
        .unwrap_or(Priority::Routine);

    // An empty capture counts as unreported, same as a missing label.
    let reasoning = parsed
        .iter()
        .filter_map(|p| p.reasoning.as_deref())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let risk_level = aggregate_risk(
        parsed
            .iter()
            .filter_map(|p| p.risk.as_deref())
            .filter(|s| !s.is_empty()),
    );

    let action_needed = parsed
        .iter()
        .filter_map(|p| p.action.as_deref())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("; ");

    PriorityDecision {
        recommended_priority,
        reasoning,
        risk_level,
        action_needed,
    }
}

/// Score each risk string (high 3, medium 2, otherwise 1), average, and
/// bucket the mean. No reported risks means Low.
fn aggregate_risk<'a>(risks: impl Iterator<Item = &'a str>) -> RiskLevel {
    let scores: Vec<u32> = risks
        .map(|risk| {
            let risk = risk.to_lowercase();
            if risk.contains("high") {
                3
            } else if risk.contains("medium") {
                2
            } else {
                1
            }
        })
        .collect();

    if scores.is_empty() {
        return RiskLevel::Low;
    }

    let average = scores.iter().sum::<u32>() as f64 / scores.len() as f64;
    if average > 2.5 {
        RiskLevel::High
    } else if average > 1.5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::triage_profiles;

    /// Replies served in profile declaration order.
    struct SequencedModel {
        replies: Vec<String>,
        calls: std::sync::Mutex<usize>,
        fail_call: Option<usize>,
    }

    impl SequencedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|r| r.to_string()).collect(),
                calls: std::sync::Mutex::new(0),
                fail_call: None,
            }
        }
    }

    impl ChatModel for SequencedModel {
        async fn generate(
            &self,
            _system_role: &str,
            _user_prompt: &str,
        ) -> Result<String, GatewayError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                let index = *calls;
                *calls += 1;
                index
            };
            if self.fail_call == Some(index) {
                return Err(GatewayError::Unreachable("http://localhost:11434".into()));
            }
            Ok(self.replies.get(index).cloned().unwrap_or_default())
        }
    }

    fn patient(id: &str, priority: &str) -> PatientRecord {
        serde_json::from_value(serde_json::json!({
            "Patient_ID": id,
            "Priority": priority,
            "Specialty": "Cardiology",
            "Weeks_Waiting": 20
        }))
        .unwrap()
    }

    #[test]
    fn test_priority_synthesis_picks_highest_ordinal() {
        let replies = vec![
            "Priority: Routine\n".to_string(),
            "Priority: Cancer\n".to_string(),
            "Priority: Urgent\n".to_string(),
        ];
        let decision = synthesize(&replies);
        assert_eq!(decision.recommended_priority, Priority::Cancer);
    }

    #[test]
    fn test_priority_defaults_to_routine_when_none_reported() {
        let replies = vec!["no labels here".to_string(), String::new()];
        let decision = synthesize(&replies);
        assert_eq!(decision.recommended_priority, Priority::Routine);
    }

    #[test]
    fn test_reasonings_space_joined_in_declaration_order() {
        let replies = vec![
            "Reasoning: wait is long\n".to_string(),
            "Reasoning: condition stable\n".to_string(),
        ];
        let decision = synthesize(&replies);
        assert_eq!(decision.reasoning, "wait is long condition stable");
    }

    #[test]
    fn test_actions_joined_with_semicolons() {
        let replies = vec![
            "Action: rebook\n".to_string(),
            "Action: escalate\n".to_string(),
        ];
        let decision = synthesize(&replies);
        assert_eq!(decision.action_needed, "rebook; escalate");
    }

    #[test]
    fn test_risk_aggregation_buckets_the_average() {
        let decision = synthesize(&[
            "Risk: High risk factors\n".to_string(),
            "Risk: low severity\n".to_string(),
            "Risk: medium concern\n".to_string(),
        ]);
        // Scores 3, 1, 2 -> average 2.0 -> Medium.
        assert_eq!(decision.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_empty_captures_are_dropped_from_synthesis() {
        let replies = vec![
            "Reasoning:".to_string(),
            "Reasoning: stable condition\nRisk:".to_string(),
            "Risk: high concern\n".to_string(),
        ];
        let decision = synthesize(&replies);
        assert_eq!(decision.reasoning, "stable condition");
        // Only the one non-empty risk is scored: 3 -> High.
        assert_eq!(decision.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_risk_aggregation_extremes() {
        let high = aggregate_risk(["high", "high", "high"].into_iter());
        assert_eq!(high, RiskLevel::High);

        let low = aggregate_risk(["negligible"].into_iter());
        assert_eq!(low, RiskLevel::Low);

        let empty = aggregate_risk(std::iter::empty());
        assert_eq!(empty, RiskLevel::Low);
    }

    #[tokio::test]
    async fn test_assess_patient_synthesizes_all_agents() {
        let profiles = triage_profiles();
        let model = SequencedModel::new(&[
            "Priority: Urgent\nReasoning: long wait\nRisk: medium\nAction: rebook soon",
            "Priority: Routine\nReasoning: stable\nRisk: low\nAction: monitor",
            "Priority: Two Week Wait\nReasoning: target breached\nRisk: high\nAction: escalate",
        ]);
        let coordinator = TriageCoordinator::new(&profiles, &model);

        let decision = coordinator
            .assess_patient(&patient("P-001", "Routine"), &Value::Null)
            .await
            .unwrap();

        assert_eq!(decision.recommended_priority, Priority::TwoWeekWait);
        assert_eq!(decision.reasoning, "long wait stable target breached");
        // Scores 2, 1, 3 -> average 2.0 -> Medium.
        assert_eq!(decision.risk_level, RiskLevel::Medium);
        assert_eq!(decision.action_needed, "rebook soon; monitor; escalate");
    }

    #[tokio::test]
    async fn test_one_failed_agent_fails_the_assessment() {
        let profiles = triage_profiles();
        let mut model = SequencedModel::new(&["Priority: Urgent\n", "", ""]);
        model.fail_call = Some(1);
        let coordinator = TriageCoordinator::new(&profiles, &model);

        let result = coordinator
            .assess_patient(&patient("P-001", "Routine"), &Value::Null)
            .await;
        assert!(matches!(result, Err(GatewayError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_batch_flags_priority_changes() {
        let profiles = triage_profiles();
        // Two patients, three agent replies each.
        let model = SequencedModel::new(&[
            "Priority: Urgent\nReasoning: deteriorating\n",
            "",
            "",
            "Priority: Routine\n",
            "",
            "",
        ]);
        let coordinator = TriageCoordinator::new(&profiles, &model);

        let waiting_list = WaitingList {
            waiting_list_data: vec![patient("P-001", "Routine"), patient("P-002", "Routine")],
        };

        let results = coordinator
            .process_batch(&waiting_list, &HealthTrends::new(), false)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].change_required);
        assert_eq!(results[0].recommended_priority, Priority::Urgent);
        assert!(!results[1].change_required);
        assert_eq!(results[1].current_priority, "Routine");
    }
}
