use instant::Instant;

/// Which phase of the interaction tick is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Input = 0,
    ColliderSync = 1,
    Pick = 2,
    Lamp = 3,
}

impl SystemPhase {
    pub const ALL: [SystemPhase; 4] = [Self::Input, Self::ColliderSync, Self::Pick, Self::Lamp];

    pub fn label(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::ColliderSync => "Colliders",
            Self::Pick => "Pick",
            Self::Lamp => "Lamp",
        }
    }
}

/// Per-system timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; 4],
    /// Timestamp when `begin()` was called.
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; 4],
            start: Instant::now(),
        }
    }

    /// Call before a system runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a system finishes. Records elapsed time for `phase`.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    pub fn duration_us(&self, phase: SystemPhase) -> f64 {
        self.durations_us[phase as usize]
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        SystemPhase::ALL
            .iter()
            .map(|&p| format!("{} {:.1}us", p.label(), self.duration_us(p)))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Default for SystemTimers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_accumulate_into_total() {
        let mut timers = SystemTimers::new();
        for phase in SystemPhase::ALL {
            timers.begin();
            timers.end(phase);
        }
        assert!(timers.total_us() >= 0.0);
        assert!(timers.summary().contains("Pick"));
    }
}
