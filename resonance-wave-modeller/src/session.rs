use crate::animation::{AnimationController, Clock, TimeSequence};
use crate::domain::SpatialDomain;
use crate::wavefield::{evaluate, FieldSnapshot};
use crate::waves::{ExternalWaveSet, WaveParams};
use anyhow::Result;
use rayon::prelude::*;
use std::time::Duration;
use tracing::{info, warn};

const POLLS_PER_INTERVAL: u32 = 20;
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Everything the evaluator needs apart from the time.
#[derive(Debug, Clone)]
pub struct ResonanceParams {
    pub domain: SpatialDomain,
    pub intrinsic: WaveParams,
    pub externals: ExternalWaveSet,
}

impl ResonanceParams {
    pub fn evaluate_at(&self, t: f64) -> FieldSnapshot {
        evaluate(&self.domain, t, &self.intrinsic, &self.externals)
    }
}

/// One evaluated frame handed to a renderer.
pub struct Frame<'a> {
    pub index: usize,
    pub domain: &'a SpatialDomain,
    pub snapshot: &'a FieldSnapshot,
}

/// Display layer consuming evaluated frames.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// A single display session: its parameters plus its own animation state.
pub struct Session {
    params: ResonanceParams,
    controller: AnimationController,
}

impl Session {
    pub fn new(params: ResonanceParams, controller: AnimationController) -> Self {
        Self { params, controller }
    }

    pub fn params(&self) -> &ResonanceParams {
        &self.params
    }

    /// Parameters may change between any two frames.
    pub fn params_mut(&mut self) -> &mut ResonanceParams {
        &mut self.params
    }

    /// Replace the extrinsic waves with a fresh sweep of `count` waves.
    pub fn set_external_count(&mut self, count: usize) {
        if count != self.params.externals.len() {
            self.params.externals = ExternalWaveSet::sweep(count);
            info!(count, "reinitialised extrinsic waves");
        }
    }

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AnimationController {
        &mut self.controller
    }

    pub fn frames(&self) -> TimeSequence {
        self.controller.frames()
    }

    pub fn current_snapshot(&self) -> FieldSnapshot {
        self.params.evaluate_at(self.controller.current_time())
    }

    pub fn snapshot_at(&self, frame: usize) -> FieldSnapshot {
        self.params.evaluate_at(self.frames().time_at(frame))
    }

    /// Tick the controller and evaluate only when the frame moved.
    pub fn poll(&mut self, now: std::time::Instant) -> Option<FieldSnapshot> {
        let before = self.controller.frame_index();
        let after = self.controller.tick(now);
        (after != before).then(|| self.current_snapshot())
    }

    fn present<S: FrameSink>(&self, sink: &mut S, index: usize, snapshot: &FieldSnapshot) -> Result<()> {
        sink.present(&Frame {
            index,
            domain: &self.params.domain,
            snapshot,
        })
    }

    /// Live loop: play, then poll the controller until `duration` has passed
    /// on `clock`, presenting the initial frame and every advanced frame.
    /// A frame that fails to render is logged and skipped. Leaves the
    /// controller paused and returns the number of frames presented.
    pub fn run_live<C: Clock, S: FrameSink>(
        &mut self,
        clock: &C,
        sink: &mut S,
        duration: Duration,
    ) -> usize {
        // Each advance lands at most one poll past its interval
        let poll_interval = (self.controller.interval() / POLLS_PER_INTERVAL).max(MIN_POLL_INTERVAL);
        let start = clock.now();
        let mut presented = 0;

        info!(
            frames = self.frames().len(),
            interval_ms = self.controller.interval().as_millis() as u64,
            "starting live animation"
        );

        let initial = self.current_snapshot();
        match self.present(sink, self.controller.frame_index(), &initial) {
            Ok(()) => presented += 1,
            Err(e) => warn!("Failed to render frame {}: {}", self.controller.frame_index(), e),
        }

        self.controller.play(start);
        while clock.now().saturating_duration_since(start) < duration {
            let now = clock.now();
            if let Some(snapshot) = self.poll(now) {
                let index = self.controller.frame_index();
                match self.present(sink, index, &snapshot) {
                    Ok(()) => presented += 1,
                    Err(e) => warn!("Failed to render frame {}: {}", index, e),
                }
            }
            clock.wait(poll_interval);
        }
        self.controller.pause();

        info!(presented, frame = self.controller.frame_index(), "live animation paused");
        presented
    }

    /// Sweep mode: every frame of the time sequence once, in order, with a
    /// fixed delay between frames. Does not touch the animation state.
    pub fn run_sweep<C: Clock, S: FrameSink>(
        &self,
        clock: &C,
        sink: &mut S,
        frame_delay: Duration,
    ) -> Result<()> {
        let frames = self.frames();
        info!(frames = frames.len(), "starting frame sweep");

        for (index, t) in frames.iter() {
            let snapshot = self.params.evaluate_at(t);
            self.present(sink, index, &snapshot)?;

            if index + 1 < frames.len() {
                clock.wait(frame_delay);
            }
            if (index + 1) % 10 == 0 {
                info!("Frame {}/{} (t={:.4})", index + 1, frames.len(), t);
            }
        }

        info!("Sweep complete!");
        Ok(())
    }
}

/// Evaluate and render every frame independently across the rayon pool.
/// There is no animation state here; each frame depends only on its time.
pub fn export_parallel<F>(params: &ResonanceParams, frames: TimeSequence, render: F) -> Result<()>
where
    F: Fn(&Frame<'_>) -> Result<()> + Sync,
{
    info!(frames = frames.len(), "exporting frames in parallel");
    (0..frames.len()).into_par_iter().try_for_each(|index| {
        let snapshot = params.evaluate_at(frames.time_at(index));
        render(&Frame {
            index,
            domain: &params.domain,
            snapshot: &snapshot,
        })
    })?;
    info!("Export complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{ManualClock, PlaybackState};
    use anyhow::anyhow;
    use std::f64::consts::PI;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(usize, f64)>,
    }

    impl FrameSink for Recorder {
        fn present(&mut self, frame: &Frame<'_>) -> Result<()> {
            self.frames.push((frame.index, frame.snapshot.t));
            Ok(())
        }
    }

    struct Failing;

    impl FrameSink for Failing {
        fn present(&mut self, _frame: &Frame<'_>) -> Result<()> {
            Err(anyhow!("display went away"))
        }
    }

    fn session(frames: usize, fps: f64) -> Session {
        let params = ResonanceParams {
            domain: SpatialDomain::linspace_line(50, -PI, PI),
            intrinsic: WaveParams::intrinsic(1.0, 2.0, 0.0, 3.0),
            externals: ExternalWaveSet::sweep(3),
        };
        Session::new(params, AnimationController::new(TimeSequence::new(frames), fps))
    }

    #[test]
    fn poll_only_evaluates_on_advance() {
        let clock = ManualClock::new();
        let mut s = session(20, 10.0);
        s.controller_mut().play(clock.now());
        assert!(s.poll(clock.now()).is_none());
        clock.advance(Duration::from_millis(150));
        let snap = s.poll(clock.now()).unwrap();
        assert_eq!(snap.t, s.frames().time_at(1));
    }

    #[test]
    fn live_loop_presents_each_advance() {
        let clock = ManualClock::new();
        let mut s = session(60, 10.0);
        let mut sink = Recorder::default();
        // Polls every 5ms; advances land at 105ms, 210ms, ..., 945ms
        let presented = s.run_live(&clock, &mut sink, Duration::from_secs(1));
        assert_eq!(presented, 10);
        let indices: Vec<usize> = sink.frames.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
        assert_eq!(s.controller().state(), PlaybackState::Paused);
        assert_eq!(s.controller().frame_index(), 9);
    }

    #[test]
    fn live_loop_keeps_close_to_configured_fps() {
        let clock = ManualClock::new();
        let mut s = session(600, 20.0);
        let presented = s.run_live(&clock, &mut Recorder::default(), Duration::from_secs(10));
        // Strict interval check costs at most one poll per frame
        assert!(presented >= 190, "presented {} frames in 10s at 20 fps", presented);
        assert!(presented <= 201);
    }

    #[test]
    fn live_loop_survives_render_failures() {
        let clock = ManualClock::new();
        let mut s = session(60, 10.0);
        let presented = s.run_live(&clock, &mut Failing, Duration::from_millis(500));
        assert_eq!(presented, 0);
        assert!(s.controller().frame_index() > 0);
    }

    #[test]
    fn sweep_visits_every_frame_once() {
        let clock = ManualClock::new();
        let s = session(12, 10.0);
        let start = clock.now();
        let mut sink = Recorder::default();
        s.run_sweep(&clock, &mut sink, Duration::from_millis(200)).unwrap();

        assert_eq!(sink.frames.len(), 12);
        for (i, (index, t)) in sink.frames.iter().enumerate() {
            assert_eq!(*index, i);
            assert_eq!(*t, s.frames().time_at(i));
        }
        // Delay only between frames
        assert_eq!(clock.now() - start, Duration::from_millis(200 * 11));
        assert_eq!(s.controller().frame_index(), 0);
    }

    #[test]
    fn sweep_stops_on_render_error() {
        let clock = ManualClock::new();
        let s = session(12, 10.0);
        assert!(s.run_sweep(&clock, &mut Failing, Duration::ZERO).is_err());
    }

    #[test]
    fn changing_external_count_reinitialises_sweep() {
        let mut s = session(12, 10.0);
        s.set_external_count(5);
        assert_eq!(s.params().externals, ExternalWaveSet::sweep(5));
        assert_eq!(s.current_snapshot().externals.len(), 5);
    }

    #[test]
    fn parameter_changes_apply_to_next_frame() {
        let mut s = session(12, 10.0);
        let before = s.current_snapshot();
        s.params_mut().intrinsic.amplitude = 2.0;
        let after = s.current_snapshot();
        assert_ne!(before.experience, after.experience);
    }

    #[test]
    fn parallel_export_matches_serial_evaluation() {
        let s = session(16, 10.0);
        let seen = Mutex::new(Vec::new());
        export_parallel(s.params(), s.frames(), |frame| {
            let expected = s.snapshot_at(frame.index);
            assert_eq!(frame.snapshot, &expected);
            seen.lock().unwrap().push(frame.index);
            Ok(())
        })
        .unwrap();
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }
}
