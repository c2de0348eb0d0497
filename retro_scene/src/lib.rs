//! Scene logic for the retro desk: scroll-driven camera staging, the boot
//! screen generators (loading bar and typewriter log), the raster surface they
//! paint into, and the procedural computer model.
//!
//! Nothing in this crate touches the GPU or a window. The viewer drives it
//! through [`BootSequence::tick`] once per frame and through [`ScrollZoom`]
//! whenever the page scroll offset or the window size changes.

pub mod config;
pub mod effect;
pub mod glyphs;
pub mod model;
pub mod orbit;
pub mod progress;
pub mod raster;
pub mod screen;
pub mod sequence;
pub mod typewriter;
pub mod viewport;
pub mod zoom;

pub use config::{ClassPreset, DeviceLayout, PresetError, ScenePreset, SceneConfig, ZoomPreset};
pub use effect::{ScreenEffect, ScreenEffectConfig};
pub use glyphs::{BitmapFont, GlyphSource, TrueTypeFont};
pub use model::{
    ComputerModel, Mesh, MeshVertex, ModelPart, PartSurface, PhongMaterial, SceneLighting,
};
pub use orbit::{OrbitLimits, OrbitRig};
pub use progress::{ProgressState, ProgressTiming};
pub use raster::{Canvas, RasterStats};
pub use screen::{ScreenOptions, ScreenPainter};
pub use sequence::{BootPhase, BootSequence, FrameTick};
pub use typewriter::{TypewriterState, TypingTiming};
pub use viewport::{ViewportClass, ViewportSize};
pub use zoom::{CameraPlacement, ScrollZoom, ZoomConfigError, ZoomPhase, ZoomStageConfig};
