use std::time::{Duration, Instant};

/// Time source for the sweep: where the waits between steps happen.
pub trait Clock {
    /// Monotonic time since the clock was created.
    fn elapsed(&self) -> Duration;

    /// Block for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that advances instantly on `sleep` and remembers each request.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }

    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration;
    }
}
