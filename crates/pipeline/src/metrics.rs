use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::document::DocumentExample;

/// Running totals across every document a pipeline has processed.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_processed: AtomicUsize,
    documents_failed: AtomicUsize,

    // Timing (in microseconds)
    total_document_time_us: AtomicU64,

    total_chunks: AtomicUsize,
    total_chemicals: AtomicUsize,
    total_formulas: AtomicUsize,
    total_reactions: AtomicUsize,
    total_functions: AtomicUsize,
}

impl PipelineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_document(&self, example: &DocumentExample, duration: Duration) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.total_document_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_chunks
            .fetch_add(example.chunks.len(), Ordering::Relaxed);
        self.total_chemicals
            .fetch_add(example.chemicals.len(), Ordering::Relaxed);
        self.total_formulas
            .fetch_add(example.formulas.len(), Ordering::Relaxed);
        self.total_reactions
            .fetch_add(example.reactions.len(), Ordering::Relaxed);
        self.total_functions
            .fetch_add(example.functions.len(), Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let processed = self.documents_processed.load(Ordering::Relaxed);
        let total_us = self.total_document_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            documents_processed: processed,
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            avg_document_time_ms: if processed > 0 {
                total_us / processed as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
            total_chunks: self.total_chunks.load(Ordering::Relaxed),
            total_chemicals: self.total_chemicals.load(Ordering::Relaxed),
            total_formulas: self.total_formulas.load(Ordering::Relaxed),
            total_reactions: self.total_reactions.load(Ordering::Relaxed),
            total_functions: self.total_functions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub avg_document_time_ms: f64,
    pub total_chunks: usize,
    pub total_chemicals: usize,
    pub total_formulas: usize,
    pub total_reactions: usize,
    pub total_functions: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
