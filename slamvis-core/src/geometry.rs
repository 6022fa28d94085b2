/// Geometry primitives and marker builders for the SLAM scene
use nalgebra::{Point3, Vector3};

use crate::transform::{rotate_yaw, translate};

/// Fill color with RGBA components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }
}

/// A planar polygon of three or four vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: Vec<Point3<f32>>,
}

impl Face {
    pub fn new(vertices: &[Point3<f32>]) -> Self {
        debug_assert!(
            (3..=4).contains(&vertices.len()),
            "faces are triangles or quads"
        );
        Self {
            vertices: vertices.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Face normal from the first three vertices
    pub fn normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0];
        let v1 = self.vertices[1];
        let v2 = self.vertices[2];

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    /// Split the polygon into a triangle fan anchored at the first vertex
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        let anchor = self.vertices[0];
        self.vertices
            .windows(2)
            .skip(1)
            .map(move |pair| [anchor, pair[0], pair[1]])
    }
}

/// One solid object's boundary, as polygon faces sharing a fill color
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub faces: Vec<Face>,
    pub color: Color,
}

impl Mesh {
    pub fn new(color: Color) -> Self {
        Self {
            faces: Vec::new(),
            color,
        }
    }

    pub fn with_capacity(capacity: usize, color: Color) -> Self {
        Self {
            faces: Vec::with_capacity(capacity),
            color,
        }
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Every distinct vertex, in first-seen order
    pub fn vertices(&self) -> Vec<Point3<f32>> {
        let mut unique: Vec<Point3<f32>> = Vec::new();
        for vertex in self.faces.iter().flat_map(|face| face.vertices.iter()) {
            if !unique.contains(vertex) {
                unique.push(*vertex);
            }
        }
        unique
    }
}

/// Build an axis-aligned cube with its minimum corner at (x, y, z)
pub fn obstacle_cube(x: f32, y: f32, z: f32, size: f32) -> Mesh {
    let s = size;

    let a = Point3::new(x, y, z);
    let b = Point3::new(x + s, y, z);
    let c = Point3::new(x + s, y + s, z);
    let d = Point3::new(x, y + s, z);
    let e = Point3::new(x, y, z + s);
    let f = Point3::new(x + s, y, z + s);
    let g = Point3::new(x + s, y + s, z + s);
    let h = Point3::new(x, y + s, z + s);

    let mut mesh = Mesh::with_capacity(6, Color::WHITE);
    mesh.add_face(Face::new(&[a, b, c, d]));
    mesh.add_face(Face::new(&[e, f, g, h]));
    mesh.add_face(Face::new(&[f, g, c, b]));
    mesh.add_face(Face::new(&[e, h, d, a]));
    mesh.add_face(Face::new(&[e, f, b, a]));
    mesh.add_face(Face::new(&[h, g, c, d]));
    mesh
}

/// The five vehicle vertices before rotation and translation.
///
/// The rear face is a `l/2` by `l/3` rectangle at `y = -l/2`, and the
/// nose sits at `y = +l/2` on the local X/Z origin, so +Y is forward.
pub fn vehicle_local_vertices(vehicle_size: f32) -> [Point3<f32>; 5] {
    let l = vehicle_size;
    let w = l / 2.0;
    let h = l / 3.0;

    [
        Point3::new(-w / 2.0, -l / 2.0, -h / 2.0),
        Point3::new(w / 2.0, -l / 2.0, -h / 2.0),
        Point3::new(w / 2.0, -l / 2.0, h / 2.0),
        Point3::new(-w / 2.0, -l / 2.0, h / 2.0),
        Point3::new(0.0, l / 2.0, 0.0),
    ]
}

/// Build the vehicle pyramid at a pose, heading `theta` degrees clockwise from +Y
pub fn vehicle_pyramid(x: f32, y: f32, z: f32, theta: f32, vehicle_size: f32) -> Mesh {
    let [a, b, c, d, e] = vehicle_local_vertices(vehicle_size)
        .map(|vertex| translate(&rotate_yaw(&vertex, theta), x, y, z));

    let mut mesh = Mesh::with_capacity(5, Color::RED);
    mesh.add_face(Face::new(&[a, b, c, d]));
    mesh.add_face(Face::new(&[b, c, e]));
    mesh.add_face(Face::new(&[c, d, e]));
    mesh.add_face(Face::new(&[a, d, e]));
    mesh.add_face(Face::new(&[a, b, e]));
    mesh
}
