//! 识别会话 - 缓冲、重建、持久化的统一入口

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::warn;

use super::detection::{Detection, DetectionBuffer};
use super::reconstruct::{compact_ranges, CompactedRange, CorrectedWord, Reconstructor};
use super::store::{LogStore, StoreError};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub buffer_capacity: usize,
    /// Rewrite the detection log every N ingested detections.
    pub write_every: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DetectionBuffer::DEFAULT_CAPACITY,
            write_every: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStats {
    pub ingested: u64,
    pub buffered: usize,
}

/// One reconstruction pass: the words plus any persistence failure.
///
/// A failed log write never voids the in-memory result; the error rides
/// along for the caller to report.
#[derive(Debug)]
pub struct ReconstructOutcome {
    pub words: Vec<CorrectedWord>,
    pub persist_error: Option<StoreError>,
}

/// Facade over the whole pipeline for one recording session.
///
/// Producers feed `ingest` concurrently; reconstruction passes fold a
/// buffer snapshot with the lock already released, so oracle calls
/// never block ingestion. Without a store the session runs in-memory
/// only.
pub struct RecognitionSession {
    buffer: DetectionBuffer,
    reconstructor: Reconstructor,
    store: Option<LogStore>,
    ingested: AtomicU64,
    write_every: u64,
}

impl RecognitionSession {
    pub fn new(reconstructor: Reconstructor) -> Self {
        Self::with_config(reconstructor, SessionConfig::default())
    }

    pub fn with_config(reconstructor: Reconstructor, config: SessionConfig) -> Self {
        Self {
            buffer: DetectionBuffer::with_capacity(config.buffer_capacity),
            reconstructor,
            store: None,
            ingested: AtomicU64::new(0),
            write_every: config.write_every.max(1),
        }
    }

    pub fn with_store(mut self, store: LogStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Append one classified frame.
    ///
    /// The detection is buffered unconditionally; a log-write failure is
    /// returned for reporting but changes nothing in memory.
    pub fn ingest(&self, detection: Detection) -> Result<(), StoreError> {
        self.buffer.append(detection);
        let count = self.ingested.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(store) = &self.store {
            if count % self.write_every == 0 {
                store.write_detections(&self.buffer.snapshot())?;
            }
        }
        Ok(())
    }

    /// Replace the buffer contents wholesale (demo/replay input).
    pub fn load(&self, detections: Vec<Detection>) -> Result<(), StoreError> {
        self.buffer.clear();
        for detection in detections {
            self.buffer.append(detection);
        }
        if let Some(store) = &self.store {
            store.write_detections(&self.buffer.snapshot())?;
        }
        Ok(())
    }

    /// Compact the current buffer and persist the compacted log.
    pub fn compacted(&self) -> Vec<CompactedRange> {
        let ranges = compact_ranges(&self.buffer.snapshot());
        if let Some(store) = &self.store {
            if let Err(err) = store.write_compacted(&ranges) {
                warn!("failed to persist compacted log: {}", err);
            }
        }
        ranges
    }

    pub fn reconstruct(&self) -> ReconstructOutcome {
        self.reconstruct_with_cancel(&AtomicBool::new(false))
    }

    /// Full pass over a snapshot taken at call time.
    pub fn reconstruct_with_cancel(&self, cancel: &AtomicBool) -> ReconstructOutcome {
        let snapshot = self.buffer.snapshot();
        let ranges = compact_ranges(&snapshot);
        let candidates = self.reconstructor.segment(&ranges);
        let words = self.reconstructor.correct_words(&candidates, cancel);

        let mut persist_error = None;
        if let Some(store) = &self.store {
            let persisted = store
                .write_compacted(&ranges)
                .and_then(|_| store.write_corrected(&words));
            if let Err(err) = persisted {
                warn!("failed to persist reconstruction logs: {}", err);
                persist_error = Some(err);
            }
        }

        ReconstructOutcome {
            words,
            persist_error,
        }
    }

    /// Drop all buffered detections and reset the logs.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.buffer.clear();
        self.ingested.store(0, Ordering::Relaxed);
        match &self.store {
            Some(store) => store.clear(),
            None => Ok(()),
        }
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            ingested: self.ingested.load(Ordering::Relaxed),
            buffered: self.buffer.len(),
        }
    }
}
