//! Clocks for the render loop.
//!
//! The loop only needs one value per frame: seconds elapsed since it
//! started. [`Clock`] abstracts that read so the loop can run against the
//! real monotonic clock or a hand-driven one in tests.
//!
//! ```ignore
//! use portal_scene::time::{Clock, InstantClock};
//!
//! let mut clock = InstantClock::new();
//! let t0 = clock.elapsed();
//! let t1 = clock.elapsed();
//! assert!(t1 >= t0);
//! ```

use std::time::{Duration, Instant};

/// Source of elapsed seconds since the clock was created.
///
/// Implementations must never return a value smaller than an earlier read.
pub trait Clock {
    fn elapsed(&mut self) -> f32;
}

/// Monotonic clock backed by [`Instant`].
#[derive(Debug)]
pub struct InstantClock {
    start: Instant,
    last: f32,
}

impl InstantClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last: 0.0,
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for InstantClock {
    fn elapsed(&mut self) -> f32 {
        // f32 rounding can make a later Duration map to a smaller value.
        self.last = self.last.max(self.start.elapsed().as_secs_f32());
        self.last
    }
}

/// Clock advanced explicitly by the caller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: f32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward. Negative steps are ignored.
    pub fn advance(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.now += seconds;
        }
    }

    /// Jump to an absolute time, never moving backwards.
    pub fn set(&mut self, seconds: f32) {
        self.now = self.now.max(seconds);
    }
}

impl Clock for ManualClock {
    fn elapsed(&mut self) -> f32 {
        self.now
    }
}

/// Frame counting and periodic FPS measurement.
#[derive(Debug)]
pub struct FrameStats {
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: f32,
    fps_update_interval: f32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(500))
    }

    /// Recompute FPS at most once per `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: 0.0,
            fps_update_interval: interval.as_secs_f32(),
        }
    }

    /// Record a frame at `elapsed` seconds. Returns `true` when the FPS
    /// value was refreshed.
    pub fn record(&mut self, elapsed: f32) -> bool {
        self.frame_count += 1;

        let window = elapsed - self.fps_update_time;
        if window >= self.fps_update_interval && window > 0.0 {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / window;
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = elapsed;
            return true;
        }
        false
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Last measured frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_instant_clock_advances() {
        let mut clock = InstantClock::new();
        let t0 = clock.elapsed();
        thread::sleep(Duration::from_millis(10));
        let t1 = clock.elapsed();
        assert!(t1 > t0);
        assert!(t1 >= 0.01);
    }

    #[test]
    fn test_instant_clock_non_decreasing() {
        let mut clock = InstantClock::new();
        let mut last = clock.elapsed();
        for _ in 0..1000 {
            let now = clock.elapsed();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_manual_clock_never_goes_back() {
        let mut clock = ManualClock::new();
        clock.advance(1.0);
        clock.advance(-0.5);
        assert_eq!(clock.elapsed(), 1.0);
        clock.set(0.25);
        assert_eq!(clock.elapsed(), 1.0);
        clock.set(3.0);
        assert_eq!(clock.elapsed(), 3.0);
    }

    #[test]
    fn test_frame_stats_fps() {
        let mut stats = FrameStats::with_interval(Duration::from_secs(1));
        let mut refreshed = false;
        for i in 1..=60 {
            refreshed = stats.record(i as f32 / 60.0);
        }
        assert!(refreshed);
        assert_eq!(stats.frame(), 60);
        assert!((stats.fps() - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_frame_stats_waits_for_interval() {
        let mut stats = FrameStats::with_interval(Duration::from_secs(1));
        assert!(!stats.record(0.1));
        assert!(!stats.record(0.2));
        assert_eq!(stats.fps(), 0.0);
    }
}
