/// Scene controller: one vehicle marker and append-only obstacle markers
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::{SceneError, SurfaceError};
use crate::geometry::{obstacle_cube, vehicle_pyramid};
use crate::surface::{Axes, MeshHandle, PumpOutcome, RenderSurface, SessionId, WindowConfig};

/// How long `redraw` lets the surface process UI events
pub const EVENT_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

/// Sizes of the world volume and markers, in centimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub map_size_cm: f32,
    pub obstacle_size_cm: f32,
    pub vehicle_size_cm: f32,
}

impl SceneConfig {
    pub fn new(map_size_cm: f32, obstacle_size_cm: f32, vehicle_size_cm: f32) -> Self {
        Self {
            map_size_cm,
            obstacle_size_cm,
            vehicle_size_cm,
        }
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let sizes = [
            ("map_size_cm", self.map_size_cm),
            ("obstacle_size_cm", self.obstacle_size_cm),
            ("vehicle_size_cm", self.vehicle_size_cm),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value <= 0.0 {
                return Err(SceneError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn axes(&self) -> Axes {
        Axes::for_map(self.map_size_cm)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new(1000.0, 10.0, 25.0)
    }
}

/// Vehicle position (cm) and heading (degrees, clockwise from +Y)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub theta: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, z: f32, theta: f32) -> Self {
        Self { x, y, z, theta }
    }
}

/// Drives a [`RenderSurface`] showing a SLAM run.
///
/// The scene owns its surface. Exactly one vehicle mesh is on the surface
/// at any time; obstacles only accumulate.
pub struct SlamScene<S: RenderSurface> {
    surface: S,
    config: SceneConfig,
    session: SessionId,
    vehicle: MeshHandle,
    pose: Pose,
    obstacles: Vec<MeshHandle>,
}

impl<S: RenderSurface> SlamScene<S> {
    /// Open a window on `surface` and place the vehicle at the origin
    pub fn new(surface: S, config: SceneConfig) -> Result<Self, SceneError> {
        Self::with_window(surface, config, &WindowConfig::default())
    }

    pub fn with_window(
        mut surface: S,
        config: SceneConfig,
        window: &WindowConfig,
    ) -> Result<Self, SceneError> {
        config.validate()?;

        let session = surface.open(window, &config.axes())?;
        info!(
            "opened '{}' as {} (map {} cm)",
            window.title, session, config.map_size_cm
        );

        let pose = Pose::default();
        let vehicle = surface.add_mesh(vehicle_pyramid(
            pose.x,
            pose.y,
            pose.z,
            pose.theta,
            config.vehicle_size_cm,
        ));

        Ok(Self {
            surface,
            config,
            session,
            vehicle,
            pose,
            obstacles: Vec::new(),
        })
    }

    /// Place a cube obstacle with its minimum corner at (x, y, z)
    pub fn add_obstacle(&mut self, x: f32, y: f32, z: f32) {
        let handle = self
            .surface
            .add_mesh(obstacle_cube(x, y, z, self.config.obstacle_size_cm));
        debug!("obstacle {} at ({}, {}, {})", handle, x, y, z);
        self.obstacles.push(handle);
    }

    /// Move the vehicle marker to a new pose.
    ///
    /// Fails with [`SceneError::InvalidState`] if the tracked vehicle mesh
    /// has gone missing from the surface; the surface is left untouched.
    pub fn set_pose(&mut self, x: f32, y: f32, z: f32, theta: f32) -> Result<(), SceneError> {
        let mesh = vehicle_pyramid(x, y, z, theta, self.config.vehicle_size_cm);
        let old = self.vehicle;

        self.vehicle = self
            .surface
            .replace_mesh(old, mesh)
            .map_err(|err| match err {
                source @ SurfaceError::UnknownMesh(handle) => {
                    SceneError::InvalidState { handle, source }
                }
                other => SceneError::Surface(other),
            })?;
        self.pose = Pose::new(x, y, z, theta);
        debug!("vehicle {} -> {} at {:?}", old, self.vehicle, self.pose);
        Ok(())
    }

    /// Refresh the display and give it a moment to handle input.
    ///
    /// Returns `false` once the window this scene opened is gone, whether
    /// closed, replaced, or interrupted during the event wait.
    pub fn redraw(&mut self) -> bool {
        if self.surface.active_session() != Some(self.session) {
            info!("{} is no longer the active window", self.session);
            return false;
        }

        if let Err(err) = self.surface.draw() {
            warn!("draw failed on {}: {}", self.session, err);
            return false;
        }

        match self.surface.pump_events(EVENT_PUMP_TIMEOUT) {
            PumpOutcome::Completed | PumpOutcome::TimedOut => true,
            PumpOutcome::Interrupted => {
                info!("{} interrupted", self.session);
                false
            }
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn vehicle(&self) -> MeshHandle {
        self.vehicle
    }

    pub fn obstacles(&self) -> &[MeshHandle] {
        &self.obstacles
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use crate::headless::HeadlessSurface;

    fn scene(map_size_cm: f32) -> SlamScene<HeadlessSurface> {
        let config = SceneConfig {
            map_size_cm,
            ..SceneConfig::default()
        };
        SlamScene::new(HeadlessSurface::new(), config).unwrap()
    }

    fn vehicle_meshes(scene: &SlamScene<HeadlessSurface>) -> usize {
        scene
            .surface()
            .meshes()
            .iter()
            .filter(|(_, mesh)| mesh.color == Color::RED)
            .count()
    }

    #[test]
    fn test_default_config() {
        let config = SceneConfig::default();
        assert_eq!(config.map_size_cm, 1000.0);
        assert_eq!(config.obstacle_size_cm, 10.0);
        assert_eq!(config.vehicle_size_cm, 25.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        for config in [
            SceneConfig::new(0.0, 10.0, 25.0),
            SceneConfig::new(300.0, -1.0, 25.0),
            SceneConfig::new(300.0, 10.0, f32::NAN),
        ] {
            let result = SlamScene::new(HeadlessSurface::new(), config);
            assert!(matches!(result, Err(SceneError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_construct() {
        let scene = scene(300.0);
        assert_eq!(scene.surface().mesh_count(), 1);
        assert_eq!(vehicle_meshes(&scene), 1);
        assert_eq!(scene.obstacle_count(), 0);
        assert_eq!(scene.pose(), Pose::default());
        assert_eq!(scene.surface().active_session(), Some(scene.session()));

        let axes = scene.surface().axes().unwrap();
        assert_eq!(axes.x_limits, -150.0..150.0);
        assert_eq!(axes.z_limits, 0.0..300.0);
        assert_eq!(axes.labels[0], "X (cm)");
        assert!(!axes.grid);
    }

    #[test]
    fn test_obstacles_survive_pose_updates() {
        let mut scene = scene(300.0);
        for i in 0..7 {
            scene.add_obstacle(i as f32 * 10.0, -50.0, 0.0);
        }
        let before: Vec<MeshHandle> = scene.obstacles().to_vec();

        scene.set_pose(10.0, 10.0, 5.0, 45.0).unwrap();
        scene.set_pose(20.0, 10.0, 7.0, 90.0).unwrap();

        assert_eq!(scene.obstacle_count(), 7);
        for handle in before {
            assert!(scene.surface().meshes().get(handle).is_some());
        }
        assert_eq!(scene.surface().mesh_count(), 8);
    }

    #[test]
    fn test_set_pose_keeps_one_vehicle() {
        let mut scene = scene(300.0);
        let first = scene.vehicle();
        scene.set_pose(0.0, 0.0, 0.0, 0.0).unwrap();
        scene.set_pose(30.0, -20.0, 12.0, 270.0).unwrap();

        assert_eq!(vehicle_meshes(&scene), 1);
        assert_ne!(scene.vehicle(), first);
        assert_eq!(scene.pose(), Pose::new(30.0, -20.0, 12.0, 270.0));

        let vehicle = scene.surface().meshes().get(scene.vehicle()).unwrap();
        assert_eq!(vehicle.faces.len(), 5);
    }

    #[test]
    fn test_set_pose_with_stale_vehicle() {
        let mut scene = scene(300.0);
        let handle = scene.vehicle();
        scene.surface_mut().remove_mesh(handle).unwrap();

        let result = scene.set_pose(1.0, 2.0, 3.0, 4.0);
        assert!(matches!(
            result,
            Err(SceneError::InvalidState { handle: h, .. }) if h == handle
        ));
        assert_eq!(scene.surface().mesh_count(), 0);
        assert_eq!(scene.pose(), Pose::default());
    }

    #[test]
    fn test_invalid_state_keeps_surface_error() {
        use std::error::Error;

        let mut scene = scene(300.0);
        let handle = scene.vehicle();
        scene.surface_mut().remove_mesh(handle).unwrap();

        let err = scene.set_pose(0.0, 0.0, 0.0, 90.0).unwrap_err();
        let message = err.to_string();
        assert_eq!(message.matches(&handle.to_string()).count(), 1, "{}", message);

        let source = err.source().expect("surface error attached");
        assert_eq!(source.to_string(), SurfaceError::UnknownMesh(handle).to_string());
    }

    #[test]
    fn test_redraw_while_open() {
        let mut scene = scene(300.0);
        scene.set_pose(0.0, 0.0, 0.0, 0.0).unwrap();
        scene.add_obstacle(50.0, -50.0, 0.0);

        assert!(scene.redraw());
        assert_eq!(scene.surface().draw_count(), 1);

        scene.surface_mut().script_pump([PumpOutcome::Completed]);
        assert!(scene.redraw());
    }

    #[test]
    fn test_redraw_after_session_replaced() {
        let mut scene = scene(300.0);
        scene.surface_mut().replace_session();

        assert!(!scene.redraw());
        assert_eq!(scene.surface().draw_count(), 0);
    }

    #[test]
    fn test_redraw_after_close() {
        let mut scene = scene(300.0);
        scene.surface_mut().close();
        assert!(!scene.redraw());
        assert_eq!(scene.surface().draw_count(), 0);
    }

    #[test]
    fn test_redraw_interrupted() {
        let mut scene = scene(300.0);
        scene.surface_mut().script_pump([PumpOutcome::Interrupted]);

        assert!(!scene.redraw());
        assert_eq!(scene.surface().draw_count(), 1);
        // The window is gone for good
        assert!(!scene.redraw());
    }
}
