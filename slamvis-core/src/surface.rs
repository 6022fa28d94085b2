/// The interactive drawing surface a scene renders onto
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use nalgebra::{Point3, Vector3};

use crate::error::SurfaceError;
use crate::geometry::Mesh;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one opened window.
///
/// A surface hands out a fresh id every time it opens a window, so a
/// scene can tell its own window apart from one created after it closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Handle to a mesh registered on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(u64);

impl MeshHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// Result of waiting on the surface's event pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Pending events were processed before the timeout
    Completed,
    /// Nothing arrived before the timeout
    TimedOut,
    /// The user interrupted or the window went away during the wait
    Interrupted,
}

/// Window title and physical footprint
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    /// Width and height in inches
    pub footprint: (f32, f32),
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "SLAM 3D".to_string(),
            footprint: (10.0, 10.0),
        }
    }
}

/// Axis limits, labels, and grid toggle of the 3D plot
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub x_limits: Range<f32>,
    pub y_limits: Range<f32>,
    pub z_limits: Range<f32>,
    pub labels: [String; 3],
    pub grid: bool,
}

impl Axes {
    /// X and Y centered on the origin, Z rising from the floor
    pub fn for_map(map_size_cm: f32) -> Self {
        let half = map_size_cm / 2.0;
        Self {
            x_limits: -half..half,
            y_limits: -half..half,
            z_limits: 0.0..map_size_cm,
            labels: [
                "X (cm)".to_string(),
                "Y (cm)".to_string(),
                "Z (cm)".to_string(),
            ],
            grid: false,
        }
    }

    pub fn min(&self) -> Point3<f32> {
        Point3::new(self.x_limits.start, self.y_limits.start, self.z_limits.start)
    }

    pub fn max(&self) -> Point3<f32> {
        Point3::new(self.x_limits.end, self.y_limits.end, self.z_limits.end)
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::from((self.min().coords + self.max().coords) / 2.0)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max() - self.min()
    }

    /// The eight corners of the bounding box
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (lo, hi) = (self.min(), self.max());
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ]
    }

    /// The twelve edges of the bounding box as corner pairs
    pub fn edges(&self) -> [(Point3<f32>, Point3<f32>); 12] {
        let c = self.corners();
        [
            (c[0], c[1]),
            (c[1], c[2]),
            (c[2], c[3]),
            (c[3], c[0]),
            (c[4], c[5]),
            (c[5], c[6]),
            (c[6], c[7]),
            (c[7], c[4]),
            (c[0], c[4]),
            (c[1], c[5]),
            (c[2], c[6]),
            (c[3], c[7]),
        ]
    }
}

/// A window that holds polygon meshes and can be redrawn on demand.
///
/// Implementations own the meshes they are given; callers keep only the
/// returned handles.
pub trait RenderSurface {
    /// Create the window and apply the axes, returning the new session
    fn open(&mut self, window: &WindowConfig, axes: &Axes) -> Result<SessionId, SurfaceError>;

    /// The session currently shown, or `None` once the window is gone
    fn active_session(&self) -> Option<SessionId>;

    fn add_mesh(&mut self, mesh: Mesh) -> MeshHandle;

    fn remove_mesh(&mut self, handle: MeshHandle) -> Result<Mesh, SurfaceError>;

    /// Swap `old` for `mesh`. Nothing is added when `old` is unknown.
    fn replace_mesh(&mut self, old: MeshHandle, mesh: Mesh) -> Result<MeshHandle, SurfaceError> {
        self.remove_mesh(old)?;
        Ok(self.add_mesh(mesh))
    }

    fn mesh_count(&self) -> usize;

    /// Refresh the display without blocking
    fn draw(&mut self) -> Result<(), SurfaceError>;

    /// Process pending UI events, waiting at most `timeout`
    fn pump_events(&mut self, timeout: Duration) -> PumpOutcome;
}

/// Handle-keyed mesh collection backing a surface's render list
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: BTreeMap<MeshHandle, Mesh>,
    next_id: u64,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: Mesh) -> MeshHandle {
        let handle = MeshHandle::new(self.next_id);
        self.next_id += 1;
        self.meshes.insert(handle, mesh);
        handle
    }

    pub fn remove(&mut self, handle: MeshHandle) -> Result<Mesh, SurfaceError> {
        self.meshes
            .remove(&handle)
            .ok_or(SurfaceError::UnknownMesh(handle))
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Meshes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &Mesh)> {
        self.meshes.iter().map(|(handle, mesh)| (*handle, mesh))
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_for_map() {
        let axes = Axes::for_map(300.0);
        assert_eq!(axes.x_limits, -150.0..150.0);
        assert_eq!(axes.y_limits, -150.0..150.0);
        assert_eq!(axes.z_limits, 0.0..300.0);
        assert_eq!(axes.labels[2], "Z (cm)");
        assert!(!axes.grid);
        assert_eq!(axes.center(), Point3::new(0.0, 0.0, 150.0));
    }

    #[test]
    fn test_axes_edges_have_axis_aligned_length() {
        let axes = Axes::for_map(300.0);
        for (a, b) in axes.edges() {
            assert!(((b - a).norm() - 300.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_mesh_store_remove_unknown() {
        let mut store = MeshStore::new();
        let handle = store.insert(Mesh::new(crate::geometry::Color::WHITE));
        assert_eq!(store.len(), 1);
        assert!(store.remove(handle).is_ok());
        assert!(matches!(
            store.remove(handle),
            Err(SurfaceError::UnknownMesh(h)) if h == handle
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_mesh_store_handles_never_reused() {
        let mut store = MeshStore::new();
        let first = store.insert(Mesh::new(crate::geometry::Color::RED));
        store.remove(first).unwrap();
        let second = store.insert(Mesh::new(crate::geometry::Color::RED));
        assert_ne!(first, second);
        assert!(store.get(first).is_none());
        assert!(store.get(second).is_some());
    }

    #[test]
    fn test_window_config_default() {
        let window = WindowConfig::default();
        assert_eq!(window.title, "SLAM 3D");
        assert_eq!(window.footprint, (10.0, 10.0));
    }
}
