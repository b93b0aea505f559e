/// Interactive terminal viewer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use meshview_core::constants::SUN_DIRECTION;
use meshview_core::{Camera, ColorMode, Mesh, ProjectionMode, RotationState, Transform};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;
pub mod viewer;

pub use renderer::AsciiRenderer;
pub use viewer::TerminalRenderer;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 0.5;

/// Rows taken by the status line
const STATUS_ROWS: u16 = 1;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    mesh: Mesh,
    /// Pose applied before the keyboard rotation
    pose: Matrix4<f64>,
    /// Centre of the posed mesh; keyboard rotation pivots here
    pivot: Point3<f64>,
    rotation: RotationState,
    camera: Camera,
    renderer: AsciiRenderer,
    color_mode: ColorMode,
    title: String,
    running: bool,
    spinning: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: Mesh, pose: Matrix4<f64>, title: impl Into<String>) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(mesh, pose, title, width, height))
    }

    /// Builds the app for a given terminal size without touching the terminal.
    pub fn with_size(
        mesh: Mesh,
        pose: Matrix4<f64>,
        title: impl Into<String>,
        width: u16,
        height: u16,
    ) -> Self {
        let rows = height.saturating_sub(STATUS_ROWS).max(1);
        let mut camera = Camera::new(width as u32, rows as u32);
        camera.aspect = width as f64 * CELL_ASPECT / rows as f64;

        // Frame the mesh as posed
        let posed: Vec<Point3<f64>> = mesh.vertices.iter().map(|v| pose.transform_point(v)).collect();
        let pivot = match Mesh::from_parts(posed, Vec::new()).bounds() {
            Some((min, max)) => {
                camera.frame_bounds(&min, &max);
                nalgebra::center(&min, &max)
            }
            None => Point3::origin(),
        };

        Self {
            mesh,
            pose,
            pivot,
            rotation: RotationState::new(0.3, 0.3, 0.0),
            camera,
            renderer: AsciiRenderer::new(width as usize, rows as usize, Vector3::from(SUN_DIRECTION)),
            color_mode: ColorMode::default(),
            title: title.into(),
            running: true,
            spinning: false,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) => self.handle_key(code),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => {
                self.rotation.rotate(0.1, 0.0, 0.0);
            }
            KeyCode::Char('s') | KeyCode::Down => {
                self.rotation.rotate(-0.1, 0.0, 0.0);
            }
            KeyCode::Char('a') | KeyCode::Left => {
                self.rotation.rotate(0.0, -0.1, 0.0);
            }
            KeyCode::Char('d') | KeyCode::Right => {
                self.rotation.rotate(0.0, 0.1, 0.0);
            }
            KeyCode::Char('e') => {
                self.rotation.rotate(0.0, 0.0, 0.1);
            }
            KeyCode::Char('r') => {
                self.rotation.rotate(0.0, 0.0, -0.1);
            }
            KeyCode::Char('p') => {
                self.camera.mode = self.camera.mode.toggled();
            }
            KeyCode::Char(' ') => {
                self.spinning = !self.spinning;
            }
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let rows = height.saturating_sub(STATUS_ROWS).max(1);
        self.renderer.resize(width as usize, rows as usize);
        self.camera.aspect = width as f64 * CELL_ASPECT / rows as f64;
    }

    fn update(&mut self) {
        if self.spinning {
            self.rotation.rotate(0.0, 0.015, 0.0);
        }
    }

    /// Keyboard rotation about the pivot, on top of the pose.
    pub fn model_matrix(&self) -> Matrix4<f64> {
        let to_pivot = Transform::translation_matrix(self.pivot.x, self.pivot.y, self.pivot.z);
        let from_pivot = Transform::translation_matrix(-self.pivot.x, -self.pivot.y, -self.pivot.z);
        to_pivot * Transform::rotation_matrix(&self.rotation) * from_pivot * self.pose
    }

    /// Rasterizes the current frame into the character buffer.
    pub fn rasterize(&mut self) -> &AsciiRenderer {
        let model = self.model_matrix();
        self.renderer.clear();
        self.renderer.render_mesh(&self.mesh, &model, &self.camera);
        &self.renderer
    }

    fn render(&mut self) -> io::Result<()> {
        let color_mode = self.color_mode;
        let mut stdout = stdout();
        self.rasterize().draw(&mut stdout, STATUS_ROWS, color_mode)?;

        let projection = match self.camera.mode {
            ProjectionMode::Perspective => "persp",
            ProjectionMode::Orthographic => "ortho",
        };
        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "{} | {} | FPS: {:.1} | WASD/Arrows=Rotate E/R=Roll P=Projection Space=Spin Q=Quit",
                self.title, projection, self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_keys_stop_the_loop() {
        for key in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = TerminalApp::with_size(Mesh::cube(1.0), Matrix4::identity(), "t", 40, 20);
            app.handle_key(key);
            assert!(!app.running);
        }
    }

    #[test]
    fn projection_and_spin_toggle() {
        let mut app = TerminalApp::with_size(Mesh::cube(1.0), Matrix4::identity(), "t", 40, 20);
        app.handle_key(KeyCode::Char('p'));
        assert_eq!(app.camera.mode, ProjectionMode::Orthographic);
        app.handle_key(KeyCode::Char(' '));
        let before = app.rotation;
        app.update();
        assert_ne!(app.rotation, before);
    }

    #[test]
    fn translated_pose_stays_in_view() {
        let pose = Transform::from_translation_rotation([10.0, -4.0, 2.0], [0.0, 0.0, 45.0]);
        let mut app = TerminalApp::with_size(Mesh::cube(2.0), pose.0, "t", 60, 31);
        let renderer = app.rasterize();
        assert_eq!((renderer.width(), renderer.height()), (60, 30));
        assert!(renderer.covered() > 0);
        assert_ne!(renderer.char_at(30, 15), ' ');
    }

    #[test]
    fn resize_updates_buffer() {
        let mut app = TerminalApp::with_size(Mesh::cube(1.0), Matrix4::identity(), "t", 40, 20);
        app.handle_event(Event::Resize(100, 41));
        assert_eq!(app.renderer.width(), 100);
        assert_eq!(app.renderer.height(), 40);
    }
}
