use serde::{Deserialize, Serialize};

use crate::core::detection::Detection;

/// 游程压缩结果 - 连续同标签检测合并成一段帧区间
///
/// 相邻判断依据缓冲顺序而不是帧号运算，帧号可能稀疏或重复。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RangeRecord", try_from = "RangeRecord")]
pub struct CompactedRange {
    pub start_frame: u64,
    pub end_frame: u64,
    pub label: String,
}

impl CompactedRange {
    pub fn frame_range(&self) -> String {
        format!("{}-{}", self.start_frame, self.end_frame)
    }
}

/// Wire form: `{"frameRange": "start-end", "label": ...}`.
#[derive(Debug, Serialize, Deserialize)]
struct RangeRecord {
    #[serde(rename = "frameRange")]
    frame_range: String,
    label: String,
}

impl From<CompactedRange> for RangeRecord {
    fn from(range: CompactedRange) -> Self {
        Self {
            frame_range: range.frame_range(),
            label: range.label,
        }
    }
}

impl TryFrom<RangeRecord> for CompactedRange {
    type Error = String;

    fn try_from(record: RangeRecord) -> Result<Self, Self::Error> {
        let (start_frame, end_frame) = parse_frame_range(&record.frame_range)
            .ok_or_else(|| format!("invalid frame range {:?}", record.frame_range))?;
        Ok(Self {
            start_frame,
            end_frame,
            label: record.label,
        })
    }
}

/// Parse a `"start-end"` frame span.
pub fn parse_frame_range(text: &str) -> Option<(u64, u64)> {
    let (start, end) = text.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// Collapse consecutive same-label detections into labeled frame ranges.
///
/// Single pass in buffer order. A frame-index regression inside a run
/// keeps the maximum seen so far instead of going backwards.
pub fn compact_ranges(detections: &[Detection]) -> Vec<CompactedRange> {
    let mut compacted = Vec::new();
    let mut current: Option<CompactedRange> = None;

    for detection in detections {
        match current.as_mut() {
            Some(range) if range.label == detection.label => {
                range.end_frame = range.end_frame.max(detection.frame_index);
            }
            _ => {
                if let Some(range) = current.take() {
                    compacted.push(range);
                }
                current = Some(CompactedRange {
                    start_frame: detection.frame_index,
                    end_frame: detection.frame_index,
                    label: detection.label.clone(),
                });
            }
        }
    }

    if let Some(range) = current {
        compacted.push(range);
    }
    compacted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(frame: u64, label: &str) -> Detection {
        Detection::new(frame, label, 0.9)
    }

    #[test]
    fn test_empty_input() {
        assert!(compact_ranges(&[]).is_empty());
    }

    #[test]
    fn test_single_entry() {
        let compacted = compact_ranges(&[det(5, "h")]);
        assert_eq!(
            compacted,
            vec![CompactedRange {
                start_frame: 5,
                end_frame: 5,
                label: "h".into()
            }]
        );
    }

    #[test]
    fn test_runs_are_merged() {
        let detections = vec![det(1, "h"), det(2, "h"), det(3, "e"), det(4, "e"), det(5, "h")];
        let compacted = compact_ranges(&detections);

        assert_eq!(compacted.len(), 3);
        assert_eq!(compacted[0].frame_range(), "1-2");
        assert_eq!(compacted[1].frame_range(), "3-4");
        // same label again after a gap opens a fresh range
        assert_eq!(compacted[2].frame_range(), "5-5");
    }

    #[test]
    fn test_frame_regression_keeps_max() {
        let detections = vec![det(10, "h"), det(8, "h"), det(12, "h")];
        let compacted = compact_ranges(&detections);

        assert_eq!(compacted.len(), 1);
        assert_eq!(compacted[0].start_frame, 10);
        assert_eq!(compacted[0].end_frame, 12);
    }

    #[test]
    fn test_already_compact_is_identity() {
        let detections = vec![det(1, "a"), det(2, "b"), det(3, "a")];
        let compacted = compact_ranges(&detections);

        assert_eq!(compacted.len(), detections.len());
        for (range, detection) in compacted.iter().zip(&detections) {
            assert_eq!(range.label, detection.label);
            assert_eq!(range.start_frame, detection.frame_index);
            assert_eq!(range.end_frame, detection.frame_index);
        }
    }

    #[test]
    fn test_no_adjacent_ranges_share_label() {
        let labels = ["a", "a", "b", "b", "b", "a", "c", "c", "a", "a"];
        let detections: Vec<_> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| det(i as u64, label))
            .collect();

        let compacted = compact_ranges(&detections);
        assert!(compacted.len() <= detections.len());
        for pair in compacted.windows(2) {
            assert_ne!(pair[0].label, pair[1].label);
        }
    }

    #[test]
    fn test_wire_round_trip() {
        let range = CompactedRange {
            start_frame: 3,
            end_frame: 9,
            label: "g".into(),
        };

        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, r#"{"frameRange":"3-9","label":"g"}"#);

        let parsed: CompactedRange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, range);
    }

    #[test]
    fn test_bad_frame_range_rejected() {
        let result: Result<CompactedRange, _> =
            serde_json::from_str(r#"{"frameRange":"oops","label":"g"}"#);
        assert!(result.is_err());
    }
}
