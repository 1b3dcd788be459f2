//! 检测日志持久化 - 三个 JSON 交换文件的整体重写

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::warn;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::detection::{parse_detection_record, Detection};
use super::reconstruct::{CompactedRange, CorrectedWord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub const DETECTIONS_LOG: &str = "detections.json";
pub const COMPACTED_LOG: &str = "compactedLog.json";
pub const CORRECTED_LOG: &str = "CorrectedLog.json";

/// Owns the three log files under one directory.
///
/// Every write replaces the whole array, so readers must tolerate the
/// file changing between reads. Writes serialize on an internal lock
/// because independent reconstruction passes may share one store.
pub struct LogStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn detections_path(&self) -> PathBuf {
        self.dir.join(DETECTIONS_LOG)
    }

    pub fn compacted_path(&self) -> PathBuf {
        self.dir.join(COMPACTED_LOG)
    }

    pub fn corrected_path(&self) -> PathBuf {
        self.dir.join(CORRECTED_LOG)
    }

    /// Tolerant read of the detection log.
    ///
    /// A missing file is an empty log; a corrupt file or malformed row
    /// is skipped with a warning, never an error.
    pub fn load_detections(&self) -> Vec<Detection> {
        let path = self.detections_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => return Vec::new(),
        };

        let rows: Vec<Value> = match serde_json::from_str(&text) {
            Ok(rows) => rows,
            Err(err) => {
                warn!("failed to read detection log {:?}: {}", path, err);
                return Vec::new();
            }
        };

        rows.into_iter().filter_map(parse_detection_record).collect()
    }

    pub fn write_detections(&self, detections: &[Detection]) -> Result<(), StoreError> {
        self.write_json(&self.detections_path(), detections)
    }

    pub fn write_compacted(&self, ranges: &[CompactedRange]) -> Result<(), StoreError> {
        self.write_json(&self.compacted_path(), ranges)
    }

    pub fn write_corrected(&self, words: &[CorrectedWord]) -> Result<(), StoreError> {
        self.write_json(&self.corrected_path(), words)
    }

    /// Reset all three logs to empty arrays.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.write_detections(&[])?;
        self.write_compacted(&[])?;
        self.write_corrected(&[])
    }

    fn write_json<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut text = serde_json::to_string_pretty(rows)?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }
}
