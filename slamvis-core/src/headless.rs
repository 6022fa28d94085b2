/// In-memory rendering surface for tests and display-less runs
use std::collections::VecDeque;
use std::time::Duration;

use log::debug;

use crate::error::SurfaceError;
use crate::geometry::Mesh;
use crate::surface::{Axes, MeshHandle, MeshStore, PumpOutcome, RenderSurface, SessionId, WindowConfig};

/// Records everything a scene asks of it without touching a display
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    meshes: MeshStore,
    session: Option<SessionId>,
    window: Option<WindowConfig>,
    axes: Option<Axes>,
    draw_count: usize,
    pump_script: VecDeque<PumpOutcome>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meshes(&self) -> &MeshStore {
        &self.meshes
    }

    pub fn window(&self) -> Option<&WindowConfig> {
        self.window.as_ref()
    }

    pub fn axes(&self) -> Option<&Axes> {
        self.axes.as_ref()
    }

    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    /// Drop the window, as if the user closed it
    pub fn close(&mut self) {
        debug!("headless surface closed");
        self.session = None;
    }

    /// Swap in a brand-new window behind the scene's back
    pub fn replace_session(&mut self) -> SessionId {
        let session = SessionId::next();
        debug!("headless surface replaced by {}", session);
        self.session = Some(session);
        session
    }

    /// Queue outcomes for upcoming `pump_events` calls; afterwards the
    /// pump reports `TimedOut`
    pub fn script_pump(&mut self, outcomes: impl IntoIterator<Item = PumpOutcome>) {
        self.pump_script.extend(outcomes);
    }
}

impl RenderSurface for HeadlessSurface {
    fn open(&mut self, window: &WindowConfig, axes: &Axes) -> Result<SessionId, SurfaceError> {
        let session = SessionId::next();
        self.window = Some(window.clone());
        self.axes = Some(axes.clone());
        self.session = Some(session);
        Ok(session)
    }

    fn active_session(&self) -> Option<SessionId> {
        self.session
    }

    fn add_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    fn remove_mesh(&mut self, handle: MeshHandle) -> Result<Mesh, SurfaceError> {
        self.meshes.remove(handle)
    }

    fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    fn draw(&mut self) -> Result<(), SurfaceError> {
        if self.session.is_none() {
            return Err(SurfaceError::Closed);
        }
        self.draw_count += 1;
        Ok(())
    }

    fn pump_events(&mut self, _timeout: Duration) -> PumpOutcome {
        let outcome = self.pump_script.pop_front().unwrap_or(PumpOutcome::TimedOut);
        if outcome == PumpOutcome::Interrupted {
            self.session = None;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;

    #[test]
    fn test_open_records_window_and_axes() {
        let mut surface = HeadlessSurface::new();
        assert!(surface.active_session().is_none());

        let session = surface
            .open(&WindowConfig::default(), &Axes::for_map(1000.0))
            .unwrap();
        assert_eq!(surface.active_session(), Some(session));
        assert_eq!(surface.window().unwrap().title, "SLAM 3D");
        assert_eq!(surface.axes().unwrap().z_limits, 0.0..1000.0);
    }

    #[test]
    fn test_replace_mesh_unknown_adds_nothing() {
        let mut surface = HeadlessSurface::new();
        let handle = surface.add_mesh(Mesh::new(Color::RED));
        surface.remove_mesh(handle).unwrap();

        let result = surface.replace_mesh(handle, Mesh::new(Color::RED));
        assert!(matches!(result, Err(SurfaceError::UnknownMesh(_))));
        assert_eq!(surface.mesh_count(), 0);
    }

    #[test]
    fn test_pump_script() {
        let mut surface = HeadlessSurface::new();
        surface
            .open(&WindowConfig::default(), &Axes::for_map(300.0))
            .unwrap();
        surface.script_pump([PumpOutcome::Completed, PumpOutcome::Interrupted]);

        let timeout = Duration::from_millis(10);
        assert_eq!(surface.pump_events(timeout), PumpOutcome::Completed);
        assert_eq!(surface.pump_events(timeout), PumpOutcome::Interrupted);
        assert!(surface.active_session().is_none());
        assert_eq!(surface.pump_events(timeout), PumpOutcome::TimedOut);
    }

    #[test]
    fn test_draw_after_close_fails() {
        let mut surface = HeadlessSurface::new();
        surface
            .open(&WindowConfig::default(), &Axes::for_map(300.0))
            .unwrap();
        surface.draw().unwrap();
        surface.close();
        assert!(matches!(surface.draw(), Err(SurfaceError::Closed)));
        assert_eq!(surface.draw_count(), 1);
    }
}
