//! Stage timing (C12): `{load, init, compute, total}` millisecond timings
//! wrapped around discovery/verification stage invocations.

use std::time::Instant;

pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub load_ms: u128,
    pub init_ms: u128,
    pub compute_ms: u128,
    pub total_ms: u128,
}

impl StageTimings {
    pub fn log(&self, operation: &str) {
        log::info!(
            "{operation}: load={}ms init={}ms compute={}ms total={}ms",
            self.load_ms,
            self.init_ms,
            self.compute_ms,
            self.total_ms
        );
    }
}
