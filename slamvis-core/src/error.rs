/// Error types for scenes and rendering surfaces
use thiserror::Error;

use crate::surface::MeshHandle;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("{0} is not registered on this surface")]
    UnknownMesh(MeshHandle),

    #[error("surface window is closed")]
    Closed,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SceneError {
    /// The tracked vehicle mesh is no longer on the surface
    #[error("vehicle {handle} is not on the surface")]
    InvalidState {
        handle: MeshHandle,
        #[source]
        source: SurfaceError,
    },

    #[error("invalid scene config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
