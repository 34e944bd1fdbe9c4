/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use rotator_core::{Camera, Mesh, Orientation, Triangle};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Converts a lit, depth-tested mesh into a grid of terminal characters
#[derive(Debug, Clone)]
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            light_dir: Vector3::new(-0.4, 0.5, 1.0).normalize(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self {
            light_dir: self.light_dir,
            ..Self::new(width, height)
        };
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, orientation: &Orientation, camera: &Camera) {
        let mvp = camera.mvp(orientation);
        let eye = orientation.inverse() * (camera.position - camera.target);
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, orientation, &mvp, &eye);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        orientation: &Orientation,
        mvp: &Matrix4<f32>,
        eye: &Vector3<f32>,
    ) {
        let normal = triangle.face_normal();
        // Skip faces turned away from the camera
        if normal.dot(&(eye - triangle.vertices[0].position.coords)) <= 0.0 {
            return;
        }

        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen.iter_mut().zip(&triangle.vertices) {
            match Camera::project(mvp, &vertex.position, self.width as u32, self.height as u32) {
                Some(projected) => *slot = projected,
                None => return,
            }
        }

        // Light is fixed to the view, so shade with the rotated normal
        let brightness = (orientation * normal).dot(&self.light_dir).max(0.0);
        let index = ((brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize)
            .min(LUMINOSITY_RAMP.len() - 1);
        self.rasterize_triangle(&screen, LUMINOSITY_RAMP[index]);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;

        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p)
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    /// Queue the buffer to `writer`, one row per terminal line starting at `top`.
    pub fn draw<W: Write>(&self, writer: &mut W, top: u16) -> std::io::Result<()> {
        for (y, row) in self.char_buffer.chunks(self.width.max(1)).enumerate() {
            writer.queue(MoveTo(0, top + y as u16))?;
            for &c in row {
                let color = match c {
                    '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::Reset,
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn framed_camera(mesh: &Mesh, width: usize, height: usize) -> Camera {
        let mut camera = Camera::new(width as u32, height as u32);
        camera.frame_radius(mesh.bounding_radius());
        camera
    }

    fn filled(renderer: &AsciiRenderer) -> usize {
        (0..renderer.height())
            .flat_map(|y| (0..renderer.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| renderer.cell(x, y) != Some(' '))
            .count()
    }

    #[test]
    fn test_cube_covers_the_centre() {
        let cube = Mesh::cube(2.0);
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_mesh(&cube, &Orientation::identity(), &framed_camera(&cube, 40, 20));

        assert_ne!(renderer.cell(20, 10), Some(' '));
        assert_eq!(renderer.cell(0, 0), Some(' '));
    }

    #[test]
    fn test_clear_empties_the_buffer() {
        let cube = Mesh::cube(2.0);
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_mesh(&cube, &Orientation::identity(), &framed_camera(&cube, 40, 20));
        assert!(filled(&renderer) > 0);

        renderer.clear();
        assert_eq!(filled(&renderer), 0);
    }

    #[test]
    fn test_shading_follows_orientation() {
        let cube = Mesh::cube(2.0);
        let camera = framed_camera(&cube, 40, 20);
        let mut front = AsciiRenderer::new(40, 20);
        front.render_mesh(&cube, &Orientation::identity(), &camera);

        let mut tilted = AsciiRenderer::new(40, 20);
        let turn = Orientation::from_euler_angles(0.0, 0.6, 0.0);
        tilted.render_mesh(&cube, &turn, &camera);

        assert_ne!(front.cell(20, 10), tilted.cell(20, 10));
    }

    #[test]
    fn test_resize() {
        let mut renderer = AsciiRenderer::new(4, 4);
        renderer.resize(10, 3);
        assert_eq!((renderer.width(), renderer.height()), (10, 3));
        assert_eq!(renderer.cell(9, 2), Some(' '));
        assert_eq!(renderer.cell(10, 0), None);
    }
}
