use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::detection::Detection;

use super::compactor::{compact_ranges, parse_frame_range, CompactedRange};
use super::lexicon::DictionaryCorrector;
use super::oracle::OracleCorrector;
use super::segmenter::{CandidateWord, SegmenterConfig, WordSegmenter};

/// 纠正后的单词 - 流水线对外的输出单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WordRecord", try_from = "WordRecord")]
pub struct CorrectedWord {
    pub start_frame: u64,
    pub end_frame: u64,
    pub text: String,
}

impl CorrectedWord {
    pub fn frame_range(&self) -> String {
        format!("{}-{}", self.start_frame, self.end_frame)
    }
}

/// Wire form: `{"frame": "start-end", "string": ...}`.
#[derive(Debug, Serialize, Deserialize)]
struct WordRecord {
    frame: String,
    string: String,
}

impl From<CorrectedWord> for WordRecord {
    fn from(word: CorrectedWord) -> Self {
        Self {
            frame: word.frame_range(),
            string: word.text,
        }
    }
}

impl TryFrom<WordRecord> for CorrectedWord {
    type Error = String;

    fn try_from(record: WordRecord) -> Result<Self, Self::Error> {
        let (start_frame, end_frame) = parse_frame_range(&record.frame)
            .ok_or_else(|| format!("invalid frame range {:?}", record.frame))?;
        Ok(Self {
            start_frame,
            end_frame,
            text: record.string,
        })
    }
}

/// 重建流水线 - 压缩、分词、纠正的一次性折叠
///
/// Correction strategy is picked by configuration: with an oracle
/// corrector attached every word goes to the oracles, otherwise the
/// dictionary fallback runs. The two are alternatives, never chained.
pub struct Reconstructor {
    segmenter: WordSegmenter,
    dictionary: DictionaryCorrector,
    oracle: Option<OracleCorrector>,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::with_segmenter_config(SegmenterConfig::default())
    }

    pub fn with_segmenter_config(config: SegmenterConfig) -> Self {
        Self {
            segmenter: WordSegmenter::with_config(config),
            dictionary: DictionaryCorrector::new(),
            oracle: None,
        }
    }

    pub fn with_dictionary(mut self, dictionary: DictionaryCorrector) -> Self {
        self.dictionary = dictionary;
        self
    }

    pub fn with_oracle(mut self, oracle: OracleCorrector) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Candidate words for a batch of already-compacted ranges.
    pub fn segment(&self, ranges: &[CompactedRange]) -> Vec<CandidateWord> {
        self.segmenter.segment(ranges)
    }

    /// Correct every candidate word, observing `cancel` between words.
    ///
    /// Once the flag is set the remaining words pass through raw, so
    /// the output still covers every candidate and no further oracle
    /// round-trips happen.
    pub fn correct_words(&self, words: &[CandidateWord], cancel: &AtomicBool) -> Vec<CorrectedWord> {
        let mut corrected = Vec::with_capacity(words.len());
        for (index, word) in words.iter().enumerate() {
            let text = if cancel.load(Ordering::Relaxed) {
                word.raw.clone()
            } else {
                match &self.oracle {
                    Some(oracle) => oracle.correct(&word.raw, &neighbor_context(words, index)),
                    None => self.dictionary.correct(&word.raw),
                }
            };
            corrected.push(CorrectedWord {
                start_frame: word.start_frame,
                end_frame: word.end_frame,
                text,
            });
        }
        corrected
    }

    pub fn reconstruct(&self, detections: &[Detection]) -> Vec<CorrectedWord> {
        self.reconstruct_with_cancel(detections, &AtomicBool::new(false))
    }

    pub fn reconstruct_with_cancel(
        &self,
        detections: &[Detection],
        cancel: &AtomicBool,
    ) -> Vec<CorrectedWord> {
        let ranges = compact_ranges(detections);
        let words = self.segmenter.segment(&ranges);
        self.correct_words(&words, cancel)
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}

/// Context string from the neighboring candidate words' raw text.
fn neighbor_context(words: &[CandidateWord], index: usize) -> String {
    let prev = index
        .checked_sub(1)
        .and_then(|i| words.get(i))
        .map(|word| word.raw.as_str());
    let next = words.get(index + 1).map(|word| word.raw.as_str());

    match (prev, next) {
        (Some(prev), Some(next)) => format!("{} {}", prev, next),
        (Some(prev), None) => prev.to_string(),
        (None, Some(next)) => next.to_string(),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reconstruct::oracle::MockOracle;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn det(frame: u64, label: &str) -> Detection {
        Detection::new(frame, label, 0.9)
    }

    fn hello_hi_stream() -> Vec<Detection> {
        vec![
            det(1, "h"),
            det(2, "h"),
            det(3, "e"),
            det(4, "l"),
            det(5, "l"),
            det(6, "o"),
            det(7, "sp"),
            det(8, "h"),
            det(9, "i"),
        ]
    }

    #[test]
    fn test_dictionary_pipeline_end_to_end() {
        let words = Reconstructor::new().reconstruct(&hello_hi_stream());

        assert_eq!(
            words,
            vec![
                CorrectedWord {
                    start_frame: 1,
                    end_frame: 6,
                    text: "hello".into()
                },
                CorrectedWord {
                    start_frame: 8,
                    end_frame: 9,
                    text: "hi".into()
                },
            ]
        );
    }

    #[test]
    fn test_sentinel_only_stream_yields_nothing() {
        let detections = vec![det(1, "sp"), det(2, "none"), det(3, "fn"), det(4, "sp")];
        assert!(Reconstructor::new().reconstruct(&detections).is_empty());
    }

    #[test]
    fn test_oracle_strategy_replaces_dictionary() {
        let reconstructor = Reconstructor::new().with_oracle(OracleCorrector::new(Box::new(
            MockOracle::with_fixed("mock", "howdy"),
        )));

        let words = reconstructor.reconstruct(&hello_hi_stream());
        assert_eq!(words[0].text, "howdy");
        assert_eq!(words[1].text, "howdy");
    }

    #[test]
    fn test_oracle_gets_neighbor_context() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let reconstructor = Reconstructor::new().with_oracle(OracleCorrector::new(Box::new(
            MockOracle::with_reply("spy", move |letters, context| {
                record.lock().unwrap().push((letters.to_string(), context.to_string()));
                None
            }),
        )));

        reconstructor.reconstruct(&hello_hi_stream());

        let calls = seen.lock().unwrap();
        assert_eq!(calls.as_slice(), &[
            ("hello".to_string(), "hi".to_string()),
            ("hi".to_string(), "hello".to_string()),
        ]);
    }

    #[test]
    fn test_unmatched_word_passes_through() {
        let reconstructor =
            Reconstructor::new().with_dictionary(DictionaryCorrector::with_lexicon(["hello"]));
        let detections = vec![det(1, "z"), det(2, "q"), det(3, "z"), det(4, "q"), det(5, "q")];

        let words = reconstructor.reconstruct(&detections);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "zqzqq");
    }

    #[test]
    fn test_cancel_stops_oracle_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = Arc::new(AtomicBool::new(false));

        let counter = Arc::clone(&calls);
        let flag = Arc::clone(&cancel);
        let reconstructor = Reconstructor::new().with_oracle(OracleCorrector::new(Box::new(
            MockOracle::with_reply("mock", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                flag.store(true, Ordering::SeqCst);
                Some("word".to_string())
            }),
        )));

        let words = reconstructor.reconstruct_with_cancel(&hello_hi_stream(), &cancel);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "word");
        // remaining words pass through raw, frame coverage intact
        assert_eq!(words[1].text, "hi");
        assert_eq!(words[1].frame_range(), "8-9");
    }

    #[test]
    fn test_wire_round_trip() {
        let word = CorrectedWord {
            start_frame: 1,
            end_frame: 6,
            text: "hello".into(),
        };

        let json = serde_json::to_string(&word).unwrap();
        assert_eq!(json, r#"{"frame":"1-6","string":"hello"}"#);

        let parsed: CorrectedWord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, word);
    }
}
