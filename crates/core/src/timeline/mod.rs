use std::time::Duration;

/// Fixed-step clock for headless runs. Real front-ends pass their own
/// timestamps into `tick` instead.
#[derive(Debug, Clone)]
pub struct FrameClock {
    now: Duration,
    step: Duration,
}

impl FrameClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            step,
        }
    }

    /// Clock stepping at `fps` frames per second.
    pub fn with_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn reset(&mut self) {
        self.now = Duration::ZERO;
    }

    /// Advances by one frame and returns the new time.
    pub fn advance(&mut self) -> Duration {
        self.now += self.step;
        self.now
    }
}

/// Pending one-shot timers, fired in time order. Timers scheduled for the
/// same instant fire in the order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: Vec<(Duration, T)>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self { timers: Vec::new() }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: Duration, payload: T) {
        let index = self.timers.partition_point(|(due, _)| *due <= at);
        self.timers.insert(index, (at, payload));
    }

    /// Removes and returns every timer due at or before `now`.
    pub fn drain_due(&mut self, now: Duration) -> Vec<(Duration, T)> {
        let due = self.timers.partition_point(|(at, _)| *at <= now);
        self.timers.drain(..due).collect()
    }

    /// Drops every pending timer without firing it.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.timers.len();
        self.timers.clear();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.first().map(|(at, _)| *at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn clock_advances_in_fixed_steps() {
        let mut clock = FrameClock::new(ms(16));
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), ms(32));

        clock.reset();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn drains_only_due_timers_in_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(500), "c");
        queue.schedule(ms(0), "a");
        queue.schedule(ms(250), "b");
        queue.schedule(ms(250), "b2");

        let fired: Vec<_> = queue.drain_due(ms(250)).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["a", "b", "b2"]);
        assert_eq!(queue.next_due(), Some(ms(500)));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(10), 1);
        queue.schedule(ms(20), 2);

        assert_eq!(queue.cancel_all(), 2);
        assert!(queue.drain_due(ms(1_000)).is_empty());
    }
}
