/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Point3, Vector3};
use std::io::Write;
use slamvis_core::{Axes, Camera, Face, Mesh};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Character used for the world bounding box
const EDGE_CHAR: char = '.';

/// One rasterized terminal cell
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
    depth: f32,
}

impl Cell {
    const EMPTY: Cell = Cell {
        character: ' ',
        color: Color::Reset,
        depth: f32::INFINITY,
    };
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Terminal cells are roughly twice as tall as they are wide
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / (self.height as f32 * 2.0)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::EMPTY; width * height];
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Character at a cell, for inspecting a rendered frame
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x].character)
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, camera: &Camera) {
        let color = terminal_color(mesh.color);
        for face in &mesh.faces {
            self.render_face(face, color, camera);
        }
    }

    fn render_face(&mut self, face: &Face, color: Color, camera: &Camera) {
        // Light from the eye so faces turned towards the viewer read brightest
        let light_dir = (camera.position - camera.target).normalize();
        let brightness = face.normal().dot(&light_dir).abs();
        let character = shade(brightness);

        for triangle in face.triangles() {
            if let Some(coords) = self.project_triangle(&triangle, camera) {
                self.rasterize_triangle(&coords, character, color);
            }
        }
    }

    fn project_triangle(
        &self,
        triangle: &[Point3<f32>; 3],
        camera: &Camera,
    ) -> Option<[(f32, f32, f32); 3]> {
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (vertex, coords) in triangle.iter().zip(screen_coords.iter_mut()) {
            // Off-screen vertices are fine, the bounding box clamp trims them;
            // only a vertex behind the eye drops the triangle
            *coords = camera.project_unclipped(vertex, self.width as u32, self.height as u32)?;
        }
        Some(screen_coords)
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, color: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x as usize, y as usize, depth, character, color);
                    }
                }
            }
        }
    }

    /// Draw the twelve edges of the world volume
    pub fn render_axes(&mut self, axes: &Axes, camera: &Camera) {
        for (a, b) in axes.edges() {
            self.render_line(&a, &b, camera);
        }
    }

    fn render_line(&mut self, a: &Point3<f32>, b: &Point3<f32>, camera: &Camera) {
        let (w, h) = (self.width as u32, self.height as u32);
        let (Some(a), Some(b)) = (
            camera.project_unclipped(a, w, h),
            camera.project_unclipped(b, w, h),
        ) else {
            return;
        };
        let Some((t0, t1)) = clip_segment((a.0, a.1), (b.0, b.1), self.width as f32, self.height as f32)
        else {
            return;
        };

        let lerp = |t: f32| {
            (
                a.0 + (b.0 - a.0) * t,
                a.1 + (b.1 - a.1) * t,
                a.2 + (b.2 - a.2) * t,
            )
        };
        let (start, end) = (lerp(t0), lerp(t1));

        let steps = (end.0 - start.0).abs().max((end.1 - start.1).abs()).ceil() as usize;
        for i in 0..=steps {
            let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
            let x = start.0 + (end.0 - start.0) * t;
            let y = start.1 + (end.1 - start.1) * t;
            let depth = start.2 + (end.2 - start.2) * t;
            if x >= 0.0 && y >= 0.0 && (x as usize) < self.width && (y as usize) < self.height {
                self.plot(x as usize, y as usize, depth, EDGE_CHAR, Color::DarkGrey);
            }
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, character: char, color: Color) {
        let idx = y * self.width + x;
        if depth < self.cells[idx].depth {
            self.cells[idx] = Cell {
                character,
                color,
                depth,
            };
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                writer.queue(SetForegroundColor(cell.color))?;
                writer.queue(Print(cell.character))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map brightness in [0, 1] onto the luminosity ramp, skipping blank
fn shade(brightness: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = 1 + (brightness.clamp(0.0, 1.0) * (last - 1) as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(last)]
}

/// Nearest terminal color for a mesh fill
fn terminal_color(color: slamvis_core::Color) -> Color {
    let rgb = Vector3::new(color.r, color.g, color.b);
    if rgb.x > 0.5 && rgb.y < 0.5 && rgb.z < 0.5 {
        Color::Red
    } else if rgb.min() > 0.75 {
        Color::White
    } else {
        Color::Rgb {
            r: (rgb.x * 255.0) as u8,
            g: (rgb.y * 255.0) as u8,
            b: (rgb.z * 255.0) as u8,
        }
    }
}

/// Liang-Barsky clip of segment `a`-`b` against the rectangle
/// `[0, width] x [0, height]`, returning the visible parameter range
fn clip_segment(a: (f32, f32), b: (f32, f32), width: f32, height: f32) -> Option<(f32, f32)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for (p, q) in [(-dx, a.0), (dx, width - a.0), (-dy, a.1), (dy, height - a.1)] {
        if p == 0.0 {
            // Parallel to this edge
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((t0, t1))
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
