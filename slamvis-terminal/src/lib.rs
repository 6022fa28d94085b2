/// Terminal-based rendering surface for SLAM scenes
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::{debug, info, warn};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use slamvis_core::{
    Axes, Camera, Mesh, MeshHandle, MeshStore, PumpOutcome, RenderSurface, RotationState,
    SessionId, SurfaceError, WindowConfig,
};

pub mod demo;
pub mod renderer;

pub use renderer::AsciiRenderer;

/// Orbit step per key press (radians)
const ORBIT_STEP: f32 = 0.1;

/// What a key press asks of the surface
#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyAction {
    Close,
    Interrupt,
    Orbit(f32, f32),
    ToggleProjection,
    Ignore,
}

fn key_action(key: &KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Interrupt,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Close,
        KeyCode::Char('w') | KeyCode::Up => KeyAction::Orbit(0.0, ORBIT_STEP),
        KeyCode::Char('s') | KeyCode::Down => KeyAction::Orbit(0.0, -ORBIT_STEP),
        KeyCode::Char('a') | KeyCode::Left => KeyAction::Orbit(-ORBIT_STEP, 0.0),
        KeyCode::Char('d') | KeyCode::Right => KeyAction::Orbit(ORBIT_STEP, 0.0),
        KeyCode::Char('p') => KeyAction::ToggleProjection,
        _ => KeyAction::Ignore,
    }
}

/// Interactive 3D plot drawn as ASCII art in the terminal.
///
/// Opening takes over the terminal (raw mode, alternate screen); closing
/// with `q`/`Esc` or dropping the surface hands it back.
pub struct TerminalSurface {
    meshes: MeshStore,
    session: Option<SessionId>,
    title: String,
    axes: Axes,
    orbit: RotationState,
    camera: Camera,
    renderer: AsciiRenderer,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalSurface {
    pub fn new() -> Self {
        let axes = Axes::for_map(1000.0);
        let orbit = RotationState::default();
        let renderer = AsciiRenderer::new(0, 0);
        Self {
            meshes: MeshStore::new(),
            session: None,
            title: String::new(),
            camera: Camera::for_axes(&axes, &orbit, renderer.aspect()),
            axes,
            orbit,
            renderer,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    /// Reserve the top row for the title bar and the bottom for axis info
    fn resize(&mut self, width: u16, height: u16) {
        let rows = height.saturating_sub(2) as usize;
        self.renderer.resize(width as usize, rows);
        let mode = self.camera.mode;
        self.camera = Camera::for_axes(&self.axes, &self.orbit, self.renderer.aspect());
        self.camera.mode = mode;
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            info!("closing terminal window {}", session);
            if let Err(err) = restore_terminal(&mut stdout()) {
                warn!("failed to restore terminal: {}", err);
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> PumpOutcome {
        match event {
            Event::Key(key) => match key_action(&key) {
                KeyAction::Close => {
                    self.close();
                    PumpOutcome::Interrupted
                }
                KeyAction::Interrupt => PumpOutcome::Interrupted,
                KeyAction::Orbit(d_azimuth, d_elevation) => {
                    self.orbit.rotate(d_azimuth, d_elevation);
                    self.camera.orbit_to(&self.orbit);
                    PumpOutcome::Completed
                }
                KeyAction::ToggleProjection => {
                    self.camera.mode = self.camera.mode.toggled();
                    debug!("projection -> {:?}", self.camera.mode);
                    PumpOutcome::Completed
                }
                KeyAction::Ignore => PumpOutcome::Completed,
            },
            Event::Resize(width, height) => {
                self.resize(width, height);
                PumpOutcome::Completed
            }
            _ => PumpOutcome::Completed,
        }
    }

    fn update_fps(&mut self) {
        self.frame_count += 1;
        let now = Instant::now();
        if (now - self.last_frame).as_secs() >= 1 {
            self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
            self.frame_count = 0;
            self.last_frame = now;
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer.clear();
        self.renderer.render_axes(&self.axes, &self.camera);
        for (_, mesh) in self.meshes.iter() {
            self.renderer.render_mesh(mesh, &self.camera);
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 1))?;
        self.renderer.draw(&mut stdout)?;

        // Title bar
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "{} | {} meshes | FPS: {:.1} | WASD/Arrows=Orbit P=Projection Q=Quit",
                self.title,
                self.meshes.len(),
                self.fps
            )),
            ResetColor
        )?;

        // Axis labels and limits
        let [x_label, y_label, z_label] = &self.axes.labels;
        queue!(
            stdout,
            cursor::MoveTo(0, self.renderer.height() as u16 + 1),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::DarkGrey),
            Print(format!(
                "{} [{:.0}, {:.0}]  {} [{:.0}, {:.0}]  {} [{:.0}, {:.0}]",
                x_label,
                self.axes.x_limits.start,
                self.axes.x_limits.end,
                y_label,
                self.axes.y_limits.start,
                self.axes.y_limits.end,
                z_label,
                self.axes.z_limits.start,
                self.axes.z_limits.end,
            )),
            ResetColor
        )?;

        stdout.flush()
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for TerminalSurface {
    fn open(&mut self, window: &WindowConfig, axes: &Axes) -> Result<SessionId, SurfaceError> {
        // Only one window at a time
        self.close();
        self.meshes.clear();

        let (width, height) = enter_screen(
            &mut stdout(),
            terminal::enable_raw_mode,
            terminal::size,
            restore_terminal,
        )?;

        self.title = window.title.clone();
        self.axes = axes.clone();
        self.resize(width, height);

        let session = SessionId::next();
        self.session = Some(session);
        info!("opened terminal window {} ({}x{})", session, width, height);
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
        self.render()?;
        self.update_fps();
        Ok(())
    }

    fn pump_events(&mut self, timeout: Duration) -> PumpOutcome {
        let deadline = Instant::now() + timeout;
        let mut outcome = PumpOutcome::TimedOut;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match event::poll(remaining) {
                Ok(true) => {}
                Ok(false) => return outcome,
                Err(err) => {
                    warn!("event poll failed: {}", err);
                    return PumpOutcome::Interrupted;
                }
            }

            let event = match event::read() {
                Ok(event) => event,
                Err(err) => {
                    warn!("event read failed: {}", err);
                    return PumpOutcome::Interrupted;
                }
            };

            match self.handle_event(event) {
                PumpOutcome::Interrupted => return PumpOutcome::Interrupted,
                handled => outcome = handled,
            }

            if remaining.is_zero() {
                return outcome;
            }
        }
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.close();
    }
}

/// Switch the terminal into raw mode on the alternate screen and report its
/// size. Once raw mode is on, any later failure runs `restore` before the
/// error is returned, so the caller's tty is never left raw.
fn enter_screen<W: Write>(
    mut writer: &mut W,
    enable_raw: impl FnOnce() -> io::Result<()>,
    query_size: impl FnOnce() -> io::Result<(u16, u16)>,
    restore: impl FnOnce(&mut W) -> io::Result<()>,
) -> io::Result<(u16, u16)> {
    enable_raw()?;

    let entered = execute!(writer, terminal::EnterAlternateScreen, cursor::Hide)
        .and_then(|()| query_size());
    if let Err(err) = &entered {
        warn!("terminal setup failed: {}", err);
        if let Err(restore_err) = restore(writer) {
            warn!("failed to restore terminal: {}", restore_err);
        }
    }
    entered
}

fn restore_terminal<W: Write>(mut writer: &mut W) -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(writer, terminal::LeaveAlternateScreen, cursor::Show)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Writer whose every write fails, like stdout piped into a closed reader
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_enter_screen_restores_when_write_fails() {
        let raw = Cell::new(false);
        let result = enter_screen(
            &mut BrokenPipe,
            || {
                raw.set(true);
                Ok(())
            },
            || Ok((80, 24)),
            |_| {
                raw.set(false);
                Ok(())
            },
        );

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert!(!raw.get(), "raw mode left on");
    }

    #[test]
    fn test_enter_screen_restores_when_size_fails() {
        let raw = Cell::new(false);
        let mut out = Vec::new();
        let result = enter_screen(
            &mut out,
            || {
                raw.set(true);
                Ok(())
            },
            || Err(io::Error::new(io::ErrorKind::Other, "no tty")),
            |_| {
                raw.set(false);
                Ok(())
            },
        );

        assert!(result.is_err());
        assert!(!raw.get(), "raw mode left on");
    }

    #[test]
    fn test_enter_screen_success_keeps_raw_mode() {
        let raw = Cell::new(false);
        let restored = Cell::new(false);
        let mut out = Vec::new();
        let size = enter_screen(
            &mut out,
            || {
                raw.set(true);
                Ok(())
            },
            || Ok((100, 30)),
            |_| {
                restored.set(true);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(size, (100, 30));
        assert!(raw.get());
        assert!(!restored.get());
        assert!(!out.is_empty());
    }

    #[test]
    fn test_enter_screen_raw_mode_failure_skips_restore() {
        let restored = Cell::new(false);
        let result = enter_screen(
            &mut Vec::<u8>::new(),
            || Err(io::Error::new(io::ErrorKind::Other, "not a tty")),
            || Ok((80, 24)),
            |_| {
                restored.set(true);
                Ok(())
            },
        );

        assert!(result.is_err());
        assert!(!restored.get());
    }

    #[test]
    fn test_key_actions() {
        assert_eq!(key_action(&press(KeyCode::Char('q'))), KeyAction::Close);
        assert_eq!(key_action(&press(KeyCode::Esc)), KeyAction::Close);
        assert_eq!(
            key_action(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Interrupt
        );
        assert_eq!(
            key_action(&press(KeyCode::Left)),
            KeyAction::Orbit(-ORBIT_STEP, 0.0)
        );
        assert_eq!(key_action(&press(KeyCode::Char('p'))), KeyAction::ToggleProjection);
        assert_eq!(key_action(&press(KeyCode::Char('x'))), KeyAction::Ignore);
    }

    #[test]
    fn test_unopened_surface() {
        let mut surface = TerminalSurface::new();
        assert!(surface.active_session().is_none());
        assert!(matches!(surface.draw(), Err(SurfaceError::Closed)));
    }

    #[test]
    fn test_meshes_without_terminal() {
        let mut surface = TerminalSurface::new();
        let cube = slamvis_core::geometry::obstacle_cube(0.0, 0.0, 0.0, 10.0);
        let handle = surface.add_mesh(cube);
        assert_eq!(surface.mesh_count(), 1);

        let vehicle = slamvis_core::geometry::vehicle_pyramid(0.0, 0.0, 0.0, 0.0, 25.0);
        let replaced = surface.replace_mesh(handle, vehicle).unwrap();
        assert_ne!(replaced, handle);
        assert_eq!(surface.mesh_count(), 1);
        assert!(surface.remove_mesh(handle).is_err());
    }

    #[test]
    fn test_orbit_and_projection_events() {
        let mut surface = TerminalSurface::new();
        let before = surface.camera.position;

        let outcome = surface.handle_event(Event::Key(press(KeyCode::Right)));
        assert_eq!(outcome, PumpOutcome::Completed);
        assert_ne!(surface.camera.position, before);

        surface.handle_event(Event::Key(press(KeyCode::Char('p'))));
        assert_eq!(surface.camera.mode, slamvis_core::ProjectionMode::Orthographic);

        let outcome = surface.handle_event(Event::Key(press(KeyCode::Char('c'))));
        assert_eq!(outcome, PumpOutcome::Completed);
    }

    #[test]
    fn test_resize_reserves_overlay_rows() {
        let mut surface = TerminalSurface::new();
        surface.resize(100, 30);
        assert_eq!(surface.renderer.width(), 100);
        assert_eq!(surface.renderer.height(), 28);
    }
}
