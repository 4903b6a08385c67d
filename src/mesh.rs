//! Triangle-list geometry on the CPU and its GPU-resident counterpart.
//!
//! - [`Vertex`]: interleaved position + normal, the layout every tessellator emits
//! - [`Mesh`]: an ordered, non-indexed triangle list produced by [`crate::tessellate`]
//! - [`MeshBuffer`]: a `Mesh` uploaded into a vertex buffer, released on drop
//! - [`Transform`]: translation/rotation/scale composed into an object-to-world matrix
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//!
//! Each consecutive triple of vertices is one triangle, wound counter-clockwise
//! when seen from outside the solid.

use crate::gpu::GpuContext;
use glam::{Mat4, Quat, Vec3};

/// A vertex with an object-space position and a unit-length normal.
///
/// `#[repr(C)]` plus [`bytemuck::Pod`] lets a whole `&[Vertex]` be handed to the
/// GPU as bytes without copying.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Unit-length object-space normal.
    pub normal: [f32; 3],
}

impl Vertex {
    /// The wgpu vertex buffer layout for [`Vertex`] streams (24 bytes per vertex).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
}

/// A non-indexed triangle list.
///
/// Meshes are produced whole by a tessellator and never edited afterwards; a
/// change of resolution parameters builds a fresh `Mesh`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty mesh with room for `triangles` triangles.
    pub fn with_triangle_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Appends one triangle. Vertex order is preserved as given.
    pub fn push_triangle(&mut self, a: Vertex, b: Vertex, c: Vertex) {
        self.vertices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates the mesh one triangle at a time.
    pub fn triangles(&self) -> impl Iterator<Item = &[Vertex]> {
        self.vertices.chunks_exact(3)
    }

    /// The raw interleaved vertex stream, exactly as it is uploaded.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// A [`Mesh`] uploaded to a GPU vertex buffer.
///
/// The buffer is owned exclusively; dropping the `MeshBuffer` releases it.
#[derive(Debug)]
pub struct MeshBuffer {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) vertex_count: u32,
}

impl MeshBuffer {
    /// Uploads `mesh` into a new vertex buffer.
    ///
    /// Returns `None` for an empty mesh, which has nothing to draw and cannot
    /// back a zero-sized buffer.
    pub fn upload(gpu: &GpuContext, mesh: &Mesh, label: &str) -> Option<Self> {
        use wgpu::util::DeviceExt;

        if mesh.is_empty() {
            return None;
        }

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: mesh.as_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Some(Self {
            vertex_buffer,
            vertex_count: mesh.vertex_count() as u32,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Binds the buffer to slot 0 and draws the whole triangle list.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

/// Placement of a shape, as written in scene files.
///
/// [`Transform::matrix`] scales first, then rotates, then translates.
///
/// ```
/// use lumen::{Transform, Vec3, Quat};
///
/// let ctm = Transform::new()
///     .position(Vec3::new(2.0, 0.0, -4.0))
///     .rotation(Quat::from_rotation_x(0.3))
///     .uniform_scale(0.5)
///     .matrix();
/// assert_eq!(ctm.w_axis.truncate(), Vec3::new(2.0, 0.0, -4.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    /// Per-axis scale. Negative factors mirror the shape.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotates about `axis` by `degrees`. A zero axis leaves the rotation unchanged.
    pub fn axis_angle_degrees(mut self, axis: Vec3, degrees: f32) -> Self {
        if let Some(axis) = axis.try_normalize() {
            self.rotation = Quat::from_axis_angle(axis, degrees.to_radians());
        }
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// The object-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vertex_is_24_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(Vertex::LAYOUT.array_stride, 24);
    }

    #[test]
    fn triangles_keep_their_vertex_order() {
        let v = |x: f32, y: f32| Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z);
        let mut mesh = Mesh::with_triangle_capacity(2);
        mesh.push_triangle(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0));
        mesh.push_triangle(v(0.0, 0.0), v(1.0, 1.0), v(0.0, 1.0));

        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert!(Mesh::new().is_empty());
        let tris: Vec<_> = mesh.triangles().collect();
        assert_eq!(tris[1][0], v(0.0, 0.0));
        assert_eq!(tris[1][1], v(1.0, 1.0));
        assert_eq!(tris[1][2], v(0.0, 1.0));
    }

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let m = Transform::new()
            .position(Vec3::new(1.0, 0.0, 0.0))
            .axis_angle_degrees(Vec3::Y, 90.0)
            .uniform_scale(2.0)
            .matrix();

        let p = m.transform_point3(Vec3::X);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_axis_keeps_identity_rotation() {
        let t = Transform::new().axis_angle_degrees(Vec3::ZERO, 45.0);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }
}
