//! Specialist profile tables.
//!
//! Each flow owns a fixed roster of specialist agents. The rosters are
//! built fresh per coordinator so callers can substitute synthetic
//! profiles in tests.

use crate::models::SpecialtyProfile;

/// The five specialist agents of the health-analysis flow.
pub fn health_profiles() -> Vec<SpecialtyProfile> {
    vec![
        SpecialtyProfile::new(
            "CARDIAC",
            "Cardiac Specialist AI analyzing heart health patterns, ECG data.",
            &["heart_rate"],
        ),
        SpecialtyProfile::new(
            "SLEEP",
            "Sleep health AI analyzing sleep duration across stages (awake, core, deep, REM).",
            &[
                "awake_duration",
                "core_duration",
                "deep_duration",
                "rem_duration",
            ],
        ),
        SpecialtyProfile::new(
            "ACTIVITY",
            "Activity health AI analyzing walking speed, steps, and distance.",
            &["distance_walking_running", "steps"],
        ),
        SpecialtyProfile::new(
            "RESPIRATORY",
            "Respiratory health AI analyzing respiratory rate data.",
            &["respiratory_rate"],
        ),
        SpecialtyProfile::new(
            "AUDIO",
            "Environmental audio exposure AI analyzing sound levels.",
            &["audio_exposure"],
        ),
    ]
}

/// The three specialist agents of the waiting-list flow.
pub fn triage_profiles() -> Vec<SpecialtyProfile> {
    vec![
        SpecialtyProfile::new(
            "URGENCY",
            "Urgency Assessment Specialist analyzing waiting times and deterioration patterns",
            &["weeks_waiting", "health_trends"],
        ),
        SpecialtyProfile::new(
            "CLINICAL",
            "Clinical Risk Specialist analyzing medical specialty and condition progression",
            &["specialty", "status"],
        ),
        SpecialtyProfile::new(
            "COMPLIANCE",
            "NHS Guidelines Specialist ensuring compliance with waiting time targets",
            &["priority", "breach_flag"],
        ),
    ]
}
