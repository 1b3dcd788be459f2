use std::collections::HashSet;

use super::compactor::CompactedRange;

/// 分词标签策略
///
/// 分隔标签结束当前单词并被丢弃；无信号标签是分类器噪声，
/// 跳过但不打断正在累积的单词。
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub separator_labels: HashSet<String>,
    pub noise_labels: HashSet<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            separator_labels: ["sp", "space", "_"].iter().map(|s| s.to_string()).collect(),
            noise_labels: ["fn", "none"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SegmenterConfig {
    /// Variant where a no-signal label also ends the current word.
    ///
    /// Matches builds that treated every sentinel as a word boundary.
    pub fn noise_as_separators() -> Self {
        let mut config = Self::default();
        let noise: Vec<String> = config.noise_labels.drain().collect();
        config.separator_labels.extend(noise);
        config
    }
}

/// 候选单词 - 两个分隔符之间的字母序列及其覆盖帧区间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateWord {
    pub raw: String,
    pub start_frame: u64,
    pub end_frame: u64,
}

pub struct WordSegmenter {
    config: SegmenterConfig,
}

impl WordSegmenter {
    pub fn new() -> Self {
        Self::with_config(SegmenterConfig::default())
    }

    pub fn with_config(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Walk compacted ranges and accumulate candidate words.
    ///
    /// An empty-string label outside both sentinel sets counts as an
    /// ordinary symbol: it extends the word's frame span but adds no
    /// characters. A word whose accumulated text ends up empty is
    /// dropped at flush, so `raw` is never empty.
    pub fn segment(&self, ranges: &[CompactedRange]) -> Vec<CandidateWord> {
        let mut words = Vec::new();
        let mut raw = String::new();
        let mut word_start: Option<u64> = None;
        let mut word_end = 0u64;

        for range in ranges {
            if self.config.separator_labels.contains(&range.label) {
                flush(&mut words, &mut raw, &mut word_start, word_end);
                continue;
            }
            if self.config.noise_labels.contains(&range.label) {
                continue;
            }

            if word_start.is_none() {
                word_start = Some(range.start_frame);
            }
            word_end = range.end_frame;
            raw.push_str(&range.label);
        }

        flush(&mut words, &mut raw, &mut word_start, word_end);
        words
    }
}

impl Default for WordSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

fn flush(
    words: &mut Vec<CandidateWord>,
    raw: &mut String,
    word_start: &mut Option<u64>,
    word_end: u64,
) {
    if let Some(start_frame) = word_start.take() {
        if !raw.is_empty() {
            words.push(CandidateWord {
                raw: std::mem::take(raw),
                start_frame,
                end_frame: word_end,
            });
        }
    }
    raw.clear();
}
