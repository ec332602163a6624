//! Render loop driver.
//!
//! One [`FrameLoop::tick`] is one display-synchronized cycle:
//!
//! 1. read elapsed seconds from the clock
//! 2. push them into both shader programs
//! 3. integrate orbit-control damping
//! 4. render the scene
//! 5. ask the host for the next frame
//!
//! The host owns the cadence. `tick` takes `&mut self`, so two cycles can
//! never overlap.

use glam::Mat4;

use crate::camera::CameraController;
use crate::context::AppContext;
use crate::time::{Clock, FrameStats};

/// Lifecycle of the loop. There is no terminal state; the loop ends when the
/// host stops delivering frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Per-frame values handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCommands {
    /// Seconds since the loop started.
    pub elapsed: f32,
    pub view: Mat4,
    pub projection: Mat4,
    /// Whether orbit damping moved the camera this frame.
    pub camera_moved: bool,
    /// 1-based frame number.
    pub frame: u64,
    /// Fresh FPS measurement, when one was taken this frame.
    pub fps: Option<f32>,
}

/// Draws one frame.
pub trait SceneRenderer {
    type Error;

    fn render(&mut self, ctx: &AppContext, frame: &FrameCommands) -> Result<(), Self::Error>;
}

/// Host hook for requesting the next frame callback.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Drives the per-frame cycle against a [`Clock`].
#[derive(Debug)]
pub struct FrameLoop<C: Clock> {
    clock: C,
    state: LoopState,
    stats: FrameStats,
}

impl<C: Clock> FrameLoop<C> {
    /// Create an idle loop. The clock should be started now.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: LoopState::Idle,
            stats: FrameStats::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Steps 2 and 3 of the cycle, without touching clock or renderer.
    pub fn advance(&mut self, ctx: &mut AppContext, elapsed: f32) -> FrameCommands {
        ctx.params.advance_time(elapsed);
        let camera_moved = ctx.controls.update(&mut ctx.camera);
        let fps = self.stats.record(elapsed).then(|| self.stats.fps());

        FrameCommands {
            elapsed,
            view: ctx.camera.view_matrix(),
            projection: ctx.camera.projection(),
            camera_moved,
            frame: self.stats.frame(),
            fps,
        }
    }

    /// Run one full cycle.
    ///
    /// A renderer error is returned as-is and the next frame is not
    /// requested.
    pub fn tick<R, S>(
        &mut self,
        ctx: &mut AppContext,
        renderer: &mut R,
        scheduler: &mut S,
    ) -> Result<FrameCommands, R::Error>
    where
        R: SceneRenderer + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        if self.state == LoopState::Idle {
            log::debug!("frame loop started");
            self.state = LoopState::Running;
        }

        let elapsed = self.clock.elapsed();
        let frame = self.advance(ctx, elapsed);
        log::trace!("frame {} at {:.3}s", frame.frame, elapsed);

        renderer.render(ctx, &frame)?;
        scheduler.request_frame();
        Ok(frame)
    }
}
