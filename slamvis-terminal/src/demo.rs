/// Synthetic vehicle motion for the demo loop
use rand::Rng;
use slamvis_core::{Pose, RenderSurface, SceneError, SlamScene};

/// Heading change per frame (degrees)
pub const THETA_STEP: f32 = 10.0;
/// Altitude change per frame (cm)
pub const CLIMB_STEP: f32 = 2.0;
/// Altitude band the vehicle bounces between (cm)
pub const MIN_ALTITUDE: f32 = 10.0;
pub const MAX_ALTITUDE: f32 = 500.0;

/// A vehicle spinning in place while it climbs and sinks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoState {
    pub pose: Pose,
    climbing: bool,
}

impl DemoState {
    pub fn new() -> Self {
        Self {
            pose: Pose::default(),
            climbing: true,
        }
    }

    pub fn climbing(&self) -> bool {
        self.climbing
    }

    /// Advance one frame
    pub fn step(&mut self) {
        self.pose.theta = (self.pose.theta + THETA_STEP) % 360.0;

        self.pose.z += if self.climbing { CLIMB_STEP } else { -CLIMB_STEP };
        if self.pose.z > MAX_ALTITUDE {
            self.climbing = false;
        }
        if self.pose.z < MIN_ALTITUDE {
            self.climbing = true;
        }
    }
}

impl Default for DemoState {
    fn default() -> Self {
        Self::new()
    }
}

/// Random whole-centimeter obstacle position on the map floor plan
pub fn random_obstacle<R: Rng>(rng: &mut R, map_size_cm: f32) -> (f32, f32) {
    let half = map_size_cm / 2.0;
    let x = rng.gen_range(-half..half).trunc();
    let y = rng.gen_range(-half..half).trunc();
    (x, y)
}

/// Push one demo frame into the scene: pose, then a fresh obstacle at the
/// vehicle's altitude
pub fn apply_frame<S: RenderSurface, R: Rng>(
    scene: &mut SlamScene<S>,
    state: &DemoState,
    rng: &mut R,
) -> Result<(), SceneError> {
    let Pose { x, y, z, theta } = state.pose;
    scene.set_pose(x, y, z, theta)?;

    let (ox, oy) = random_obstacle(rng, scene.config().map_size_cm);
    scene.add_obstacle(ox, oy, z);
    Ok(())
}
