/// SLAMVIS Terminal Demo - Spinning vehicle among random obstacles
///
/// Streams a synthetic SLAM run into the terminal surface.
/// Controls:
///   - WASD / Arrow Keys: Orbit the view
///   - P: Toggle perspective/orthographic projection
///   - Q/ESC: Quit

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use slamvis_core::{SceneConfig, SlamScene};
use slamvis_terminal::demo::{apply_frame, DemoState};
use slamvis_terminal::TerminalSurface;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "slamvis-terminal")]
#[command(about = "3D SLAM visualization in the terminal", long_about = None)]
struct Cli {
    /// Edge length of the world volume (cm)
    #[arg(long, default_value_t = 300.0)]
    map_size_cm: f32,

    /// Edge length of each obstacle cube (cm)
    #[arg(long, default_value_t = 10.0)]
    obstacle_size_cm: f32,

    /// Length of the vehicle marker (cm)
    #[arg(long, default_value_t = 25.0)]
    vehicle_size_cm: f32,

    /// Pause between frames (ms)
    #[arg(long, default_value_t = 50)]
    frame_delay_ms: u64,

    /// Seed for obstacle placement
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = SceneConfig::new(cli.map_size_cm, cli.obstacle_size_cm, cli.vehicle_size_cm);
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut scene = SlamScene::new(TerminalSurface::new(), config)
        .context("failed to open the terminal surface")?;
    let mut state = DemoState::new();
    let frame_delay = Duration::from_millis(cli.frame_delay_ms);

    loop {
        apply_frame(&mut scene, &state, &mut rng)?;

        if !scene.redraw() {
            break;
        }

        std::thread::sleep(frame_delay);
        state.step();
    }

    let obstacles = scene.obstacle_count();
    // Hand the terminal back before printing
    drop(scene);
    println!("Closed after placing {} obstacles", obstacles);
    Ok(())
}
