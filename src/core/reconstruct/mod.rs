//! 检测流重建 - 把逐帧字母识别流还原成可读单词
//!
//! 核心策略：
//! 1. 游程压缩 - 合并连续同标签检测为帧区间
//! 2. 分词 - 按分隔符标签切分，无信号标签按噪声跳过
//! 3. 词典纠正 - 固定词表上的有界编辑距离搜索
//! 4. Oracle 纠正 - 最多两个外部服务仲裁（可选，按配置二选一）

pub mod compactor;
pub mod lexicon;
pub mod oracle;
pub mod pipeline;
pub mod segmenter;

pub use compactor::{compact_ranges, parse_frame_range, CompactedRange};
pub use lexicon::{levenshtein, DictionaryCorrector, COMMON_WORDS};
pub use oracle::{HttpOracle, MockOracle, Oracle, OracleCorrector};
pub use pipeline::{CorrectedWord, Reconstructor};
pub use segmenter::{CandidateWord, SegmenterConfig, WordSegmenter};
