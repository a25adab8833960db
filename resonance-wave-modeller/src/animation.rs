use std::cell::Cell;
use std::f64::consts::TAU;
use std::time::{Duration, Instant};
use tracing::debug;

/// `frames` evenly spaced times over one period `[0, 2pi)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSequence {
    frames: usize,
}

impl TimeSequence {
    pub fn new(frames: usize) -> Self {
        assert!(frames > 0, "time sequence needs at least one frame");
        TimeSequence { frames }
    }

    pub fn len(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn time_at(&self, frame: usize) -> f64 {
        TAU * frame as f64 / self.frames as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.frames).map(move |i| (i, self.time_at(i)))
    }
}

/// Source of monotonic timestamps for the live loop.
pub trait Clock {
    fn now(&self) -> Instant;
    /// Suspend between two polls of the loop.
    fn wait(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wait(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to. `wait` advances it instantly.
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn wait(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Paused,
    Running,
}

/// Frame stepping state for one display session.
#[derive(Debug, Clone)]
pub struct AnimationController {
    frames: TimeSequence,
    frame_index: usize,
    state: PlaybackState,
    last_advance: Option<Instant>,
    interval: Duration,
}

impl AnimationController {
    pub fn new(frames: TimeSequence, fps: f64) -> Self {
        Self {
            frames,
            frame_index: 0,
            state: PlaybackState::Paused,
            last_advance: None,
            interval: Self::interval_for(fps),
        }
    }

    fn interval_for(fps: f64) -> Duration {
        assert!(fps.is_finite() && fps > 0.0, "fps must be positive, got {}", fps);
        Duration::from_secs_f64(1.0 / fps)
    }

    pub fn set_fps(&mut self, fps: f64) {
        self.interval = Self::interval_for(fps);
    }

    pub fn play(&mut self, now: Instant) {
        if self.state == PlaybackState::Running {
            return;
        }
        self.state = PlaybackState::Running;
        self.last_advance = Some(now);
        debug!(frame = self.frame_index, "animation playing");
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    pub fn reset(&mut self) {
        self.state = PlaybackState::Paused;
        self.frame_index = 0;
    }

    /// Advance at most one frame if more than one interval has passed since
    /// the last advance. A clock that moved backwards counts as no time.
    pub fn tick(&mut self, now: Instant) -> usize {
        if self.state != PlaybackState::Running {
            return self.frame_index;
        }
        let last = *self.last_advance.get_or_insert(now);
        if now.saturating_duration_since(last) > self.interval {
            self.frame_index = (self.frame_index + 1) % self.frames.len();
            self.last_advance = Some(now);
            debug!(frame = self.frame_index, "advanced frame");
        }
        self.frame_index
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn frames(&self) -> TimeSequence {
        self.frames
    }

    pub fn current_time(&self) -> f64 {
        self.frames.time_at(self.frame_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FPS: f64 = 10.0;

    fn controller(frames: usize) -> AnimationController {
        AnimationController::new(TimeSequence::new(frames), FPS)
    }

    fn past_interval() -> Duration {
        Duration::from_millis(101)
    }

    #[test]
    fn time_sequence_excludes_full_period() {
        let seq = TimeSequence::new(4);
        let times: Vec<f64> = seq.iter().map(|(_, t)| t).collect();
        assert_eq!(times.len(), 4);
        assert_relative_eq!(times[0], 0.0);
        assert_relative_eq!(times[1], TAU / 4.0);
        assert_relative_eq!(times[3], 3.0 * TAU / 4.0);
    }

    #[test]
    fn starts_paused_at_frame_zero() {
        let ctl = controller(60);
        assert_eq!(ctl.frame_index(), 0);
        assert_eq!(ctl.state(), PlaybackState::Paused);
        assert_eq!(ctl.current_time(), 0.0);
    }

    #[test]
    fn tick_while_paused_does_nothing() {
        let clock = ManualClock::new();
        let mut ctl = controller(60);
        clock.advance(Duration::from_secs(5));
        assert_eq!(ctl.tick(clock.now()), 0);
    }

    #[test]
    fn each_elapsed_interval_advances_one_frame() {
        let clock = ManualClock::new();
        let mut ctl = controller(60);
        for expected in 1..=3 {
            ctl.play(clock.now());
            clock.advance(past_interval());
            assert_eq!(ctl.tick(clock.now()), expected);
        }
    }

    #[test]
    fn ticks_inside_interval_hold_frame() {
        let clock = ManualClock::new();
        let mut ctl = controller(60);
        ctl.play(clock.now());
        clock.advance(Duration::from_millis(40));
        assert_eq!(ctl.tick(clock.now()), 0);
        clock.advance(Duration::from_millis(40));
        assert_eq!(ctl.tick(clock.now()), 0);
        // Exactly one interval does not exceed it
        clock.advance(Duration::from_millis(20));
        assert_eq!(ctl.tick(clock.now()), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(ctl.tick(clock.now()), 1);
    }

    #[test]
    fn long_gap_advances_only_once() {
        let clock = ManualClock::new();
        let mut ctl = controller(60);
        ctl.play(clock.now());
        clock.advance(Duration::from_secs(10));
        assert_eq!(ctl.tick(clock.now()), 1);
        assert_eq!(ctl.tick(clock.now()), 1);
    }

    #[test]
    fn wraps_after_last_frame() {
        let clock = ManualClock::new();
        let mut ctl = controller(5);
        ctl.play(clock.now());
        for _ in 0..4 {
            clock.advance(past_interval());
            ctl.tick(clock.now());
        }
        assert_eq!(ctl.frame_index(), 4);
        clock.advance(past_interval());
        assert_eq!(ctl.tick(clock.now()), 0);
    }

    #[test]
    fn clock_regression_is_not_a_tick() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(60));
        let mut ctl = controller(60);
        ctl.play(clock.now());
        let earlier = clock.now() - Duration::from_secs(30);
        assert_eq!(ctl.tick(earlier), 0);
        assert!(ctl.is_running());
    }

    #[test]
    fn pause_freezes_and_play_rebases() {
        let clock = ManualClock::new();
        let mut ctl = controller(60);
        ctl.play(clock.now());
        clock.advance(past_interval());
        ctl.tick(clock.now());
        ctl.pause();
        clock.advance(Duration::from_secs(3));
        assert_eq!(ctl.tick(clock.now()), 1);

        // Resuming starts a fresh interval
        ctl.play(clock.now());
        assert_eq!(ctl.tick(clock.now()), 1);
        clock.advance(past_interval());
        assert_eq!(ctl.tick(clock.now()), 2);
    }

    #[test]
    fn reset_rewinds_from_any_state() {
        let clock = ManualClock::new();
        let mut ctl = controller(60);
        ctl.play(clock.now());
        clock.advance(past_interval());
        ctl.tick(clock.now());
        ctl.reset();
        assert_eq!(ctl.frame_index(), 0);
        assert_eq!(ctl.state(), PlaybackState::Paused);

        ctl.reset();
        assert_eq!(ctl.frame_index(), 0);
        assert_eq!(ctl.state(), PlaybackState::Paused);
    }

    #[test]
    #[should_panic(expected = "fps must be positive")]
    fn zero_fps_is_rejected() {
        AnimationController::new(TimeSequence::new(10), 0.0);
    }
}
