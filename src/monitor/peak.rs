//! Running peak aggregation over samples.

use crate::{CpuTimes, SampleResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct PeakTracker {
    peak_memory: u64,
    peak_cpu: CpuTimes,
    samples: usize,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one sample in. CPU times are replaced only by a strictly larger
    /// user+system sum, so a stale read never moves the peak backwards.
    pub fn observe(&mut self, sample: &SampleResult) {
        self.samples = self.samples.saturating_add(1);
        self.peak_memory = self.peak_memory.max(sample.memory_bytes);
        if sample.cpu_times.total() > self.peak_cpu.total() {
            self.peak_cpu = sample.cpu_times;
        }
    }

    pub fn peak_memory(&self) -> u64 {
        self.peak_memory
    }

    pub fn peak_cpu(&self) -> CpuTimes {
        self.peak_cpu
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}
