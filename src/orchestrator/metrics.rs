use crate::prompt_engine::TransformationKind;
use std::collections::HashMap;

/// Per-kind outcome counters across batches.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    success_counts: HashMap<TransformationKind, u64>,
    failure_counts: HashMap<TransformationKind, u64>,
    cancelled_batches: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, kind: TransformationKind) {
        *self.success_counts.entry(kind).or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, kind: TransformationKind) {
        *self.failure_counts.entry(kind).or_insert(0) += 1;
    }

    pub fn record_cancelled_batch(&mut self) {
        self.cancelled_batches += 1;
    }

    pub fn get_success_count(&self, kind: TransformationKind) -> u64 {
        *self.success_counts.get(&kind).unwrap_or(&0)
    }

    pub fn get_failure_count(&self, kind: TransformationKind) -> u64 {
        *self.failure_counts.get(&kind).unwrap_or(&0)
    }

    pub fn cancelled_batches(&self) -> u64 {
        self.cancelled_batches
    }
}
