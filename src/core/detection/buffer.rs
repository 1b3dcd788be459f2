use std::collections::VecDeque;
use std::sync::Mutex;

use super::record::Detection;

/// 有界检测缓冲 - 只保留最近 N 条检测记录
///
/// 写满后丢最旧的一条，追加永不失败。快照在锁内克隆，
/// 下游处理不持锁。
pub struct DetectionBuffer {
    entries: Mutex<VecDeque<Detection>>,
    capacity: usize,
}

impl DetectionBuffer {
    pub const DEFAULT_CAPACITY: usize = 2000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn append(&self, detection: Detection) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(detection);
        }
    }

    /// Ordered copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Detection> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for DetectionBuffer {
    fn default() -> Self {
        Self::new()
    }
}
