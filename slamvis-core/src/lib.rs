/// SLAMVIS Core Library - Scene geometry and control for SLAM visualization
///
/// This library builds the vehicle and obstacle markers of a SLAM run and
/// keeps them on an interactive rendering surface. The surface itself is a
/// trait, so any front-end (or the in-memory `HeadlessSurface`) can host it.

pub mod error;
pub mod geometry;
pub mod headless;
pub mod projection;
pub mod scene;
pub mod surface;
pub mod transform;

// Re-export commonly used types
pub use error::{SceneError, SurfaceError};
pub use geometry::{Color, Face, Mesh};
pub use headless::HeadlessSurface;
pub use projection::{Camera, ProjectionMode};
pub use scene::{Pose, SceneConfig, SlamScene};
pub use surface::{Axes, MeshHandle, MeshStore, PumpOutcome, RenderSurface, SessionId, WindowConfig};
pub use transform::{rotate_yaw, translate, RotationState};
