use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::pipeline::diagnosis_time::DiagnosisTimeError;

/// One self-report: free text plus the report's creation time
/// (seconds since the Unix epoch, `created_utc` on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub text: String,
    #[serde(rename = "created_utc", default)]
    pub reference_time: Option<f64>,
}

impl DiagnosisRecord {
    pub fn new(text: impl Into<String>, reference_time: Option<f64>) -> Self {
        Self {
            text: text.into(),
            reference_time,
        }
    }

    /// Calendar date (UTC) of the reference time, used to anchor relative
    /// expressions. `None` when absent or out of chrono's range.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        let ts = self.reference_time?;
        if !ts.is_finite() {
            return None;
        }
        let secs = ts.floor() as i64;
        let nanos = ((ts - ts.floor()) * 1e9) as u32;
        DateTime::from_timestamp(secs, nanos).map(|dt| dt.date_naive())
    }
}

/// Extracted diagnosis time for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub sentence: String,
    /// Echo of the input reference time.
    #[serde(rename = "self_report_utc")]
    pub reference_time: Option<f64>,
    pub diagnosis_time_value: String,
    pub diagnosis_time_text: String,
}

/// Load a JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<DiagnosisRecord>, DiagnosisTimeError> {
    let content = std::fs::read_to_string(path)?;
    let records: Vec<DiagnosisRecord> = serde_json::from_str(&content)?;
    Ok(records)
}

/// Write one entry per input record (`null` where nothing was extracted).
/// Parent directories are created as needed.
pub fn write_results(
    path: &Path,
    results: &[Option<ExtractionResult>],
) -> Result<(), DiagnosisTimeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string(results)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_created_utc() {
        let json = r#"{"text": "I was diagnosed in 2015.", "created_utc": 1554076800}"#;
        let record: DiagnosisRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.reference_time, Some(1554076800.0));
        assert_eq!(
            record.reference_date(),
            NaiveDate::from_ymd_opt(2019, 4, 1)
        );
    }

    #[test]
    fn record_without_timestamp() {
        let record: DiagnosisRecord = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert!(record.reference_time.is_none());
        assert!(record.reference_date().is_none());

        let record: DiagnosisRecord =
            serde_json::from_str(r#"{"text": "hi", "created_utc": null}"#).unwrap();
        assert!(record.reference_date().is_none());
    }

    #[test]
    fn fractional_timestamp_keeps_date() {
        let record = DiagnosisRecord::new("x", Some(1554076799.75));
        assert_eq!(
            record.reference_date(),
            NaiveDate::from_ymd_opt(2019, 3, 31)
        );
    }

    #[test]
    fn result_serializes_wire_names() {
        let result = ExtractionResult {
            sentence: "I was diagnosed in 2015.".into(),
            reference_time: Some(1554076800.0),
            diagnosis_time_value: "2015".into(),
            diagnosis_time_text: "2015".into(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"self_report_utc\":1554076800.0"));
        assert!(json.contains("\"diagnosis_time_value\":\"2015\""));
        assert!(json.contains("\"diagnosis_time_text\":\"2015\""));
    }

    #[test]
    fn results_written_with_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");
        let results = vec![
            None,
            Some(ExtractionResult {
                sentence: "s".into(),
                reference_time: None,
                diagnosis_time_value: "2019-03".into(),
                diagnosis_time_text: "March 2019".into(),
            }),
        ];
        write_results(&path, &results).unwrap();

        let written: Vec<Option<ExtractionResult>> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, results);
    }

    #[test]
    fn load_records_reads_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"[{"text": "a", "created_utc": 1.5}, {"text": "b", "created_utc": null}]"#,
        )
        .unwrap();
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "b");
    }

    #[test]
    fn load_records_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_records(&path),
            Err(DiagnosisTimeError::Json(_))
        ));
    }
}
