use std::time::{Duration, Instant};

/// Fixed-rate frame pacing that drops, never queues.
///
/// If a frame runs long, the deadlines it missed are counted as skipped and
/// the next deadline is set one period after now.
#[derive(Debug, Clone)]
pub struct FrameClock {
    period: Duration,
    next: Instant,
    frames: u64,
    skipped: u64,
}

impl FrameClock {
    pub fn new(fps: f32, now: Instant) -> Self {
        let period = Duration::from_secs_f32(1.0 / fps.clamp(1.0, 1000.0));
        Self::with_period(period, now)
    }

    pub fn with_period(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now + period,
            frames: 0,
            skipped: 0,
        }
    }

    /// How long the caller may sleep (or wait for input) before the next frame.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// `true` when a frame is due. Advances the deadline when it is.
    pub fn tick(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }

        self.frames += 1;
        let late = now - self.next;
        if late >= self.period {
            self.skipped += (late.as_nanos() / self.period.as_nanos().max(1)) as u64;
            self.next = now + self.period;
        } else {
            self.next += self.period;
        }
        true
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
