//! Adaptive batch sizing controller.
//!
//! Consulted before each `Execute` batch and updated after each one completes.
//! Memoryless beyond the last batch: `success_rate` is replaced, not averaged,
//! which keeps the controller reactive on bursty workloads at the cost of not
//! smoothing out noise.

use std::time::{Duration, Instant};

const ADJUSTMENT_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AdaptiveStats {
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub consecutive_fails: u32,
    last_adjustment: Option<Instant>,
    current_size: usize,
    min_size: usize,
    max_size: usize,
}

impl AdaptiveStats {
    pub fn new(initial_size: usize, min_size: usize, max_size: usize) -> Self {
        Self {
            success_rate: 1.0,
            avg_duration_ms: 0.0,
            consecutive_fails: 0,
            last_adjustment: None,
            current_size: initial_size.clamp(min_size, max_size),
            min_size,
            max_size,
        }
    }

    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Record one batch's outcome and adjust the current size per the fixed
    /// thresholds. A no-op within the 5-second cooldown window.
    pub fn record_batch(&mut self, success_rate: f64, avg_duration_ms: f64, now: Instant) {
        self.success_rate = success_rate;
        self.avg_duration_ms = avg_duration_ms;

        if let Some(last) = self.last_adjustment {
            if now.duration_since(last) < ADJUSTMENT_COOLDOWN {
                return;
            }
        }

        let mut adjusted = false;

        if success_rate < 0.5 {
            self.current_size = (self.current_size / 2).max(self.min_size);
            self.consecutive_fails += 1;
            adjusted = true;
        } else if success_rate < 0.8 {
            self.current_size = (((self.current_size as f64) * 0.75) as usize).max(self.min_size);
            self.consecutive_fails += 1;
            adjusted = true;
        } else if success_rate >= 0.95 && self.consecutive_fails == 0 {
            self.current_size = (((self.current_size as f64) * 1.25).ceil() as usize).min(self.max_size);
            adjusted = true;
        }

        if success_rate >= 0.9 {
            self.consecutive_fails = 0;
        }

        self.current_size = self.current_size.clamp(self.min_size, self.max_size);

        if adjusted {
            self.last_adjustment = Some(now);
        }
    }
}
