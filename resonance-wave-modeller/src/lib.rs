//! Resonance wave modeller.
//!
//! An intrinsic travelling wave is superposed with one or more extrinsic
//! waves, linearly and through a multiplicative cross term, giving the
//! resonant field `psi_r`. Two observables are derived from it: the
//! experience field `psi_r^2` and the perception field `|d psi_r / dt|`.
//!
//! [`evaluate`] is the pure numerical entry point, [`AnimationController`]
//! steps frames over one period, and [`colour`] maps fields onto color
//! scales for display.

pub mod animation;
pub mod colour;
pub mod config;
pub mod domain;
pub mod session;
pub mod visualisation;
pub mod waves;
pub mod wavefield;

pub use animation::{AnimationController, Clock, ManualClock, PlaybackState, SystemClock, TimeSequence};
pub use colour::{colors_for_rows, colors_for_values, ColorScale, Colormap, Rgb, ValueRange};
pub use config::{Config, Preset};
pub use domain::SpatialDomain;
pub use session::{export_parallel, Frame, FrameSink, ResonanceParams, Session};
pub use visualisation::{RenderStyle, WavefieldVisualiser};
pub use wavefield::{evaluate, FieldSnapshot, FieldStats};
pub use waves::{ExternalWaveSet, WaveParams};
