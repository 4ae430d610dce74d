//! Import adapter for Apple-Health-style CSV exports.
//!
//! A format adapter, not architecture: rows are routed into the fixed
//! metric vocabulary the rest of the system understands. Unrecognized
//! record types and malformed rows are skipped, never fatal.

use crate::models::{GroupedRecords, MetricRecord, MetricValue};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// The closed metric vocabulary produced by this adapter.
pub const METRIC_KEYS: &[&str] = &[
    "heart_rate",
    "distance_walking_running",
    "body_weight",
    "awake_duration",
    "core_duration",
    "deep_duration",
    "rem_duration",
    "steps",
    "respiratory_rate",
    "audio_exposure",
];

/// Timestamp layout used by the export, e.g. `2024-11-10 08:30:00 +0000`.
const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

#[derive(Debug, Deserialize)]
struct ExportRow {
    #[serde(rename = "type")]
    record_type: String,
    #[serde(rename = "startDate")]
    start_date: String,
    #[serde(rename = "endDate")]
    end_date: String,
    value: String,
}

/// Parse a health export CSV into grouped metric records.
///
/// Every key of the closed vocabulary is present in the result, empty or
/// not, so downstream statistics see a stable shape.
pub fn parse_health_export(path: &Path) -> Result<GroupedRecords> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open health export: {}", path.display()))?;

    let mut groups: GroupedRecords = METRIC_KEYS
        .iter()
        .map(|k| (k.to_string(), Vec::new()))
        .collect();

    let mut skipped = 0usize;
    for row in reader.deserialize::<ExportRow>() {
        match row {
            Ok(row) => route_row(&mut groups, row),
            Err(e) => {
                debug!("Skipping malformed export row: {}", e);
                skipped += 1;
            }
        }
    }

    let total: usize = groups.values().map(Vec::len).sum();
    info!(
        "Imported {} records from {} ({} malformed rows skipped)",
        total,
        path.display(),
        skipped
    );

    Ok(groups)
}

fn route_row(groups: &mut GroupedRecords, row: ExportRow) {
    let target = match row.record_type.as_str() {
        "HeartRate" => "heart_rate",
        "DistanceWalkingRunning" => "distance_walking_running",
        "BodyMass" => "body_weight",
        "StepCount" => "steps",
        "RespiratoryRate" => "respiratory_rate",
        "EnvironmentalAudioExposure" => "audio_exposure",
        "SleepAnalysis" => {
            route_sleep_row(groups, row);
            return;
        }
        // Unrecognized record types are dropped by design.
        _ => return,
    };

    let record = MetricRecord {
        value: MetricValue::from_raw(&row.value),
        start_date: row.start_date,
        end_date: row.end_date,
    };

    if let Some(records) = groups.get_mut(target) {
        records.push(record);
    }
}

/// Sleep rows carry a stage category in `value`; the metric value becomes
/// the stage duration in minutes, bucketed per stage.
fn route_sleep_row(groups: &mut GroupedRecords, row: ExportRow) {
    let target = match row.value.as_str() {
        "HKCategoryValueSleepAnalysisAsleepCore" => "core_duration",
        "HKCategoryValueSleepAnalysisAsleepDeep" => "deep_duration",
        "HKCategoryValueSleepAnalysisAsleepREM" => "rem_duration",
        "HKCategoryValueSleepAnalysisAwake" => "awake_duration",
        _ => return,
    };

    let minutes = duration_minutes(&row.start_date, &row.end_date);
    let record = MetricRecord {
        value: MetricValue::Number(minutes),
        start_date: row.start_date,
        end_date: row.end_date,
    };

    if let Some(records) = groups.get_mut(target) {
        records.push(record);
    }
}

/// Span between two export timestamps in minutes; zero when either side
/// fails to parse.
fn duration_minutes(start: &str, end: &str) -> f64 {
    match (parse_export_timestamp(start), parse_export_timestamp(end)) {
        (Some(s), Some(e)) => (e - s).num_seconds() as f64 / 60.0,
        _ => 0.0,
    }
}

pub fn parse_export_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw.trim(), EXPORT_TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_export(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_routes_recognized_record_types() {
        let file = write_export(
            "type,startDate,endDate,value\n\
             HeartRate,2024-11-10 08:00:00 +0000,2024-11-10 08:01:00 +0000,72\n\
             StepCount,2024-11-10 09:00:00 +0000,2024-11-10 10:00:00 +0000,4200\n\
             RespiratoryRate,2024-11-10 08:00:00 +0000,2024-11-10 08:05:00 +0000,15.5\n",
        );

        let groups = parse_health_export(file.path()).unwrap();
        assert_eq!(groups["heart_rate"].len(), 1);
        assert_eq!(groups["steps"].len(), 1);
        assert_eq!(groups["respiratory_rate"].len(), 1);
        assert_eq!(
            groups["respiratory_rate"][0].value,
            MetricValue::Number(15.5)
        );
    }

    #[test]
    fn test_unrecognized_record_types_are_dropped() {
        let file = write_export(
            "type,startDate,endDate,value\n\
             BloodGlucose,2024-11-10 08:00:00 +0000,2024-11-10 08:01:00 +0000,5.4\n\
             HeartRate,2024-11-10 08:00:00 +0000,2024-11-10 08:01:00 +0000,65\n",
        );

        let groups = parse_health_export(file.path()).unwrap();
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, 1);
        assert_eq!(groups["heart_rate"].len(), 1);
    }

    #[test]
    fn test_sleep_rows_bucket_by_stage_with_minute_durations() {
        let file = write_export(
            "type,startDate,endDate,value\n\
             SleepAnalysis,2024-11-10 01:00:00 +0000,2024-11-10 02:30:00 +0000,HKCategoryValueSleepAnalysisAsleepDeep\n\
             SleepAnalysis,2024-11-10 02:30:00 +0000,2024-11-10 02:45:00 +0000,HKCategoryValueSleepAnalysisAsleepREM\n\
             SleepAnalysis,2024-11-10 02:45:00 +0000,2024-11-10 02:46:00 +0000,HKCategoryValueSleepAnalysisUnknownStage\n",
        );

        let groups = parse_health_export(file.path()).unwrap();
        assert_eq!(groups["deep_duration"][0].value, MetricValue::Number(90.0));
        assert_eq!(groups["rem_duration"][0].value, MetricValue::Number(15.0));
        assert!(groups["awake_duration"].is_empty());
    }

    #[test]
    fn test_unparseable_sleep_timestamps_yield_zero_duration() {
        let file = write_export(
            "type,startDate,endDate,value\n\
             SleepAnalysis,not-a-date,also-not,HKCategoryValueSleepAnalysisAwake\n",
        );

        let groups = parse_health_export(file.path()).unwrap();
        assert_eq!(groups["awake_duration"][0].value, MetricValue::Number(0.0));
    }

    #[test]
    fn test_every_vocabulary_key_present_even_when_empty() {
        let file = write_export("type,startDate,endDate,value\n");

        let groups = parse_health_export(file.path()).unwrap();
        for key in METRIC_KEYS {
            assert!(groups.contains_key(*key), "missing key {key}");
        }
    }

    #[test]
    fn test_export_timestamp_parsing() {
        assert!(parse_export_timestamp("2024-11-10 08:30:00 +0000").is_some());
        assert!(parse_export_timestamp("2024-11-10T08:30:00Z").is_none());
    }
}
