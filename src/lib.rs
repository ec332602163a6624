//! # Portal Scene
//!
//! A baked-lighting portal diorama rendered with wgpu: a static model, an
//! animated portal surface, two clouds of drifting fireflies and a damped
//! orbit camera.
//!
//! ## Quick Start
//!
//! ```ignore
//! use portal_scene::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let config = SceneConfig::default();
//!     portal_scene::run(config)
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Frame loop
//!
//! Each display frame runs one [`FrameLoop::tick`]: read the clock, push the
//! elapsed time into both shader programs, integrate orbit damping, render,
//! then request the next frame. The renderer and the scheduler are traits, so
//! the loop runs headless in tests:
//!
//! ```ignore
//! let mut ctx = AppContext::new(SceneConfig::default(), 800, 600, 1.0);
//! let mut frame_loop = FrameLoop::new(ManualClock::new());
//! frame_loop.tick(&mut ctx, &mut my_renderer, &mut my_scheduler)?;
//! ```
//!
//! ### Viewport
//!
//! Resize and scale-factor events go through [`handle_resize`], which keeps
//! the camera aspect, the render target and the firefly pixel density in
//! step. The device pixel ratio is clamped once (default maximum 2) and
//! stored in [`Viewport::pixel_ratio`].
//!
//! ### Fireflies
//!
//! [`ParticleField`] generates position and scale buffers under a
//! [`FieldPolicy`]:
//!
//! | Policy | X, Z | Y |
//! |--------|------|---|
//! | `Ambient { half_extent: 2.0, height: 1.2 }` | `[-2, 2)` | `[0, 1.2)` |
//! | `Cluster { min: 1.0, max: 2.0, y: 0.0 }` | `[1, 2)` | `0` |
//!
//! ### Materials
//!
//! Model nodes are shaded by name through a [`MaterialPolicy`]:
//! `poleLightA`/`poleLightB` glow, `portalLight` runs the portal shader,
//! everything else samples the baked texture.

pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod context;
pub mod error;
pub mod fireflies;
pub mod frame_loop;
pub mod gpu;
pub mod scene;
pub mod time;
pub mod uniforms;
pub mod viewport;

pub use app::run;
pub use assets::{AssetLoader, FileLoader, TextureData};
pub use camera::{CameraController, OrbitControls, PerspectiveCamera};
pub use config::SceneConfig;
pub use context::AppContext;
pub use error::{AppError, AssetError, ConfigError, GpuError};
pub use fireflies::{FieldPolicy, FireflyInstance, ParticleField};
pub use frame_loop::{FrameCommands, FrameLoop, FrameScheduler, LoopState, SceneRenderer};
pub use glam::{Vec2, Vec3};
pub use scene::{MaterialKind, MaterialPolicy, Scene};
pub use time::{Clock, InstantClock, ManualClock};
pub use uniforms::{ShaderParameters, UniformSet, UniformValue};
pub use viewport::{clamp_pixel_ratio, handle_resize, RenderTarget, Viewport};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use portal_scene::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::run;
    pub use crate::assets::{AssetLoader, FileLoader};
    pub use crate::config::SceneConfig;
    pub use crate::context::AppContext;
    pub use crate::error::AppError;
    pub use crate::fireflies::{FieldPolicy, ParticleField};
    pub use crate::frame_loop::{FrameLoop, FrameScheduler, SceneRenderer};
    pub use crate::time::{Clock, InstantClock, ManualClock};
    pub use crate::viewport::{handle_resize, RenderTarget};
    pub use crate::{Vec2, Vec3};
}
