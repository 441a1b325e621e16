pub mod batch;
pub mod handlers;
pub mod staging;
pub mod store;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A file received from a client, held in memory until staged for parsing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Which extraction pipeline the remote service runs for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingMethod {
    #[default]
    AiPowered,
    Ocr,
}

impl ParsingMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ai_powered" => Some(Self::AiPowered),
            "ocr" => Some(Self::Ocr),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiPowered => "ai_powered",
            Self::Ocr => "ocr",
        }
    }

    /// Fixed confidence assigned to completed results for this method.
    pub fn confidence_score(self) -> i32 {
        match self {
            Self::AiPowered => 95,
            Self::Ocr => 90,
        }
    }
}

/// Terminal outcome of one parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingStatus {
    Completed,
    Failed,
}

impl ParsingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Per-file state while a batch is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Waiting,
    Processing,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One result record per processed file. Immutable once built; the store
/// owns it from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub original_filename: String,
    pub file_url: Option<String>,
    pub parsing_method: ParsingMethod,
    pub parsing_status: ParsingStatus,
    pub parsed_data: Value,
    /// Client-measured wall-clock seconds. The remote service reports its own
    /// processing time inside `parsed_data`; we keep our own measurement.
    pub processing_time: f64,
    pub confidence_score: i32,
}

impl ParseResult {
    pub fn completed(
        original_filename: String,
        file_url: String,
        method: ParsingMethod,
        parsed_data: Value,
        processing_time: f64,
    ) -> Self {
        Self {
            original_filename,
            file_url: Some(file_url),
            parsing_method: method,
            parsing_status: ParsingStatus::Completed,
            parsed_data,
            processing_time,
            confidence_score: method.confidence_score(),
        }
    }

    pub fn failed(
        original_filename: String,
        file_url: Option<String>,
        method: ParsingMethod,
        error: String,
    ) -> Self {
        Self {
            original_filename,
            file_url,
            parsing_method: method,
            parsing_status: ParsingStatus::Failed,
            parsed_data: json!({ "error": error }),
            processing_time: 0.0,
            confidence_score: 0,
        }
    }
}

/// Ordered per-file statuses for one batch. Owned exclusively by the
/// coordinator, mutated in place, discarded when the batch finishes.
#[derive(Debug)]
pub struct BatchProgress {
    slots: Vec<FileStatus>,
}

impl BatchProgress {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![FileStatus::Waiting; len],
        }
    }

    pub fn set(&mut self, index: usize, status: FileStatus) {
        self.slots[index] = status;
    }

    pub fn statuses(&self) -> &[FileStatus] {
        &self.slots
    }
}

/// Per-batch breakdown returned by the multi-file endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub successful: Vec<ParseResult>,
    pub failed: Vec<FailedFile>,
    pub total_processed: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub filename: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_fixed_per_method() {
        assert_eq!(ParsingMethod::AiPowered.confidence_score(), 95);
        assert_eq!(ParsingMethod::Ocr.confidence_score(), 90);
    }

    #[test]
    fn test_method_parse_known_values() {
        assert_eq!(ParsingMethod::parse("ai_powered"), Some(ParsingMethod::AiPowered));
        assert_eq!(ParsingMethod::parse("ocr"), Some(ParsingMethod::Ocr));
        assert_eq!(ParsingMethod::parse("telepathy"), None);
    }

    #[test]
    fn test_method_default_is_ai_powered() {
        assert_eq!(ParsingMethod::default(), ParsingMethod::AiPowered);
    }

    #[test]
    fn test_completed_result_carries_method_confidence() {
        let result = ParseResult::completed(
            "resume.pdf".to_string(),
            "http://minio/uploads/resume.pdf".to_string(),
            ParsingMethod::Ocr,
            json!({"name": "Ada"}),
            1.25,
        );
        assert_eq!(result.parsing_status, ParsingStatus::Completed);
        assert_eq!(result.confidence_score, 90);
        assert_eq!(result.processing_time, 1.25);
    }

    #[test]
    fn test_failed_result_zeroes_time_and_confidence() {
        let result = ParseResult::failed(
            "resume.pdf".to_string(),
            None,
            ParsingMethod::AiPowered,
            "remote returned 500".to_string(),
        );
        assert_eq!(result.parsing_status, ParsingStatus::Failed);
        assert_eq!(result.processing_time, 0.0);
        assert_eq!(result.confidence_score, 0);
        assert_eq!(
            result.parsed_data.get("error").and_then(|e| e.as_str()),
            Some("remote returned 500")
        );
    }

    #[test]
    fn test_parsed_data_json_round_trip_preserves_structure() {
        let data = json!({
            "personal": {"name": "Ada Lovelace", "age": 36},
            "skills": ["math", "analysis", null],
            "employed": false,
            "scores": [1.5, 2, {"nested": []}]
        });
        let result = ParseResult::completed(
            "resume.pdf".to_string(),
            "http://minio/uploads/resume.pdf".to_string(),
            ParsingMethod::AiPowered,
            data.clone(),
            0.5,
        );
        let encoded = serde_json::to_string(&result).unwrap();
        let decoded: ParseResult = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.parsed_data, data);
    }

    #[test]
    fn test_batch_summary_uses_camel_case_keys() {
        let summary = BatchSummary {
            successful: vec![],
            failed: vec![FailedFile {
                filename: "a.pdf".to_string(),
                error: "boom".to_string(),
            }],
            total_processed: 1,
            success_count: 0,
            failure_count: 1,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("totalProcessed").is_some());
        assert!(value.get("successCount").is_some());
        assert!(value.get("failureCount").is_some());
        assert_eq!(value["failed"][0]["filename"], "a.pdf");
    }

    #[test]
    fn test_progress_starts_all_waiting() {
        let progress = BatchProgress::new(3);
        assert!(progress
            .statuses()
            .iter()
            .all(|s| *s == FileStatus::Waiting));
    }

    #[test]
    fn test_progress_set_updates_single_slot() {
        let mut progress = BatchProgress::new(2);
        progress.set(1, FileStatus::Processing);
        assert_eq!(progress.statuses()[0], FileStatus::Waiting);
        assert_eq!(progress.statuses()[1], FileStatus::Processing);
    }
}
