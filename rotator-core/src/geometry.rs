/// Triangle meshes for the models a catalog can name
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Counter-clockwise face normal, or zero for a degenerate triangle
    pub fn face_normal(&self) -> Vector3<f32> {
        let [a, b, c] = self.vertices.map(|v| v.position);
        (b - a)
            .cross(&(c - a))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Shapes that need no file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Cube,
    Octahedron,
}

impl Shape {
    pub fn mesh(self) -> Mesh {
        match self {
            Shape::Cube => Mesh::cube(2.0),
            Shape::Octahedron => Mesh::octahedron(1.5),
        }
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Distance from the origin to the farthest vertex
    pub fn bounding_radius(&self) -> f32 {
        self.triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .map(|v| v.position.coords.norm())
            .fold(0.0, f32::max)
    }

    /// Axis-aligned cube centred on the origin
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let corner = |i: usize| {
            Point3::new(
                if i & 1 == 0 { -h } else { h },
                if i & 2 == 0 { -h } else { h },
                if i & 4 == 0 { -h } else { h },
            )
        };
        // Corner indices of each face, counter-clockwise seen from outside
        const FACES: [[usize; 4]; 6] = [
            [4, 5, 7, 6],
            [1, 0, 2, 3],
            [2, 6, 7, 3],
            [0, 1, 5, 4],
            [1, 3, 7, 5],
            [0, 4, 6, 2],
        ];

        let mut mesh = Self::with_capacity(12);
        for [a, b, c, d] in FACES {
            mesh.add_flat(corner(a), corner(b), corner(c));
            mesh.add_flat(corner(a), corner(c), corner(d));
        }
        mesh
    }

    /// Regular octahedron with its tips on the axes at `radius`
    pub fn octahedron(radius: f32) -> Self {
        let tips = [
            Point3::new(radius, 0.0, 0.0),
            Point3::new(-radius, 0.0, 0.0),
            Point3::new(0.0, radius, 0.0),
            Point3::new(0.0, -radius, 0.0),
            Point3::new(0.0, 0.0, radius),
            Point3::new(0.0, 0.0, -radius),
        ];
        const FACES: [[usize; 3]; 8] = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];

        let mut mesh = Self::with_capacity(8);
        for [a, b, c] in FACES {
            mesh.add_flat(tips[a], tips[b], tips[c]);
        }
        mesh
    }

    fn add_flat(&mut self, a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) {
        let normal = (b - a).cross(&(c - a)).normalize();
        self.add_triangle(Triangle::new(
            Vertex::new(a, normal),
            Vertex::new(b, normal),
            Vertex::new(c, normal),
        ));
    }
}
