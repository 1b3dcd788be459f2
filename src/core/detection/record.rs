use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 检测记录 - 分类器对单帧的一次输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    #[serde(rename = "frame_count")]
    pub frame_index: u64,
    pub label: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Detection {
    pub fn new(frame_index: u64, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            frame_index,
            label: label.into(),
            confidence,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// 持久化日志中的两种历史编码
///
/// 旧版记录器写 `[frame, confidence, label]` 数组，新版写带
/// `frame_count` 键的对象，两种都要能读回来。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DetectionRecord {
    Entry {
        #[serde(alias = "frame")]
        frame_count: u64,
        label: String,
        #[serde(default)]
        confidence: f32,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Row(u64, f32, String),
}

impl From<DetectionRecord> for Detection {
    fn from(record: DetectionRecord) -> Self {
        match record {
            DetectionRecord::Entry {
                frame_count,
                label,
                confidence,
                timestamp,
            } => Detection {
                frame_index: frame_count,
                label,
                confidence,
                timestamp,
            },
            DetectionRecord::Row(frame, confidence, label) => Detection {
                frame_index: frame,
                label,
                confidence,
                timestamp: None,
            },
        }
    }
}

/// Normalize one persisted log row into a canonical [`Detection`].
///
/// Malformed rows are dropped with a warning so one bad row never
/// poisons the rest of the log.
pub fn parse_detection_record(value: Value) -> Option<Detection> {
    match serde_json::from_value::<DetectionRecord>(value) {
        Ok(record) => Some(record.into()),
        Err(err) => {
            warn!("skipping malformed detection record: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entry_record() {
        let value = json!({
            "frame_count": 12,
            "timestamp": "2025-03-01T10:00:00",
            "label": "h",
            "confidence": 0.91,
            "frame_path": "frames/frame_00012_x.jpg"
        });

        let detection = parse_detection_record(value).expect("entry form should parse");
        assert_eq!(detection.frame_index, 12);
        assert_eq!(detection.label, "h");
        assert!((detection.confidence - 0.91).abs() < 1e-6);
        assert_eq!(detection.timestamp.as_deref(), Some("2025-03-01T10:00:00"));
    }

    #[test]
    fn test_parse_entry_record_frame_alias() {
        let value = json!({ "frame": 3, "label": "a" });

        let detection = parse_detection_record(value).expect("frame alias should parse");
        assert_eq!(detection.frame_index, 3);
        assert_eq!(detection.confidence, 0.0);
        assert_eq!(detection.timestamp, None);
    }

    #[test]
    fn test_parse_row_record() {
        let value = json!([7, 0.85, "g"]);

        let detection = parse_detection_record(value).expect("row form should parse");
        assert_eq!(detection.frame_index, 7);
        assert_eq!(detection.label, "g");
        assert!((detection.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_parse_malformed_record_skipped() {
        assert!(parse_detection_record(json!({"label": "h"})).is_none());
        assert!(parse_detection_record(json!([1, 0.5])).is_none());
        assert!(parse_detection_record(json!("h")).is_none());
    }

    #[test]
    fn test_serialized_form_parses_back() {
        let detection = Detection::new(5, "k", 0.7).with_timestamp("2025-03-01T10:00:00");
        let value = serde_json::to_value(&detection).unwrap();

        assert_eq!(value["frame_count"], 5);
        let parsed = parse_detection_record(value).unwrap();
        assert_eq!(parsed, detection);
    }
}
