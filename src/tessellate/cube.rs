//! Unit cube with each face split into an `n × n` grid of tiles.

use glam::Vec3;

use super::{ShapeParams, fraction};
use crate::mesh::{Mesh, Vertex};

const H: f32 = 0.5;

/// Face corners as `[top_left, top_right, bottom_left, bottom_right]`, seen from
/// outside the cube.
const FACES: [[Vec3; 4]; 6] = [
    // +Z
    [
        Vec3::new(-H, H, H),
        Vec3::new(H, H, H),
        Vec3::new(-H, -H, H),
        Vec3::new(H, -H, H),
    ],
    // -Z
    [
        Vec3::new(H, H, -H),
        Vec3::new(-H, H, -H),
        Vec3::new(H, -H, -H),
        Vec3::new(-H, -H, -H),
    ],
    // -X
    [
        Vec3::new(-H, H, -H),
        Vec3::new(-H, H, H),
        Vec3::new(-H, -H, -H),
        Vec3::new(-H, -H, H),
    ],
    // +X
    [
        Vec3::new(H, H, H),
        Vec3::new(H, H, -H),
        Vec3::new(H, -H, H),
        Vec3::new(H, -H, -H),
    ],
    // +Y
    [
        Vec3::new(-H, H, -H),
        Vec3::new(H, H, -H),
        Vec3::new(-H, H, H),
        Vec3::new(H, H, H),
    ],
    // -Y
    [
        Vec3::new(-H, -H, H),
        Vec3::new(H, -H, H),
        Vec3::new(-H, -H, -H),
        Vec3::new(H, -H, -H),
    ],
];

/// Tessellates the cube. Only `param1` is used.
pub fn tessellate(params: ShapeParams) -> Mesh {
    let n = params.param1();
    let mut mesh = Mesh::with_triangle_capacity(6 * 2 * (n * n) as usize);

    for [tl, tr, bl, br] in FACES {
        let at = |u: f32, v: f32| tl.lerp(tr, u).lerp(bl.lerp(br, u), v);

        for row in 0..n {
            let (v0, v1) = (fraction(row, n), fraction(row + 1, n));
            for col in 0..n {
                let (u0, u1) = (fraction(col, n), fraction(col + 1, n));
                tile(&mut mesh, at(u0, v0), at(u1, v0), at(u0, v1), at(u1, v1));
            }
        }
    }

    mesh
}

fn tile(mesh: &mut Mesh, tl: Vec3, tr: Vec3, bl: Vec3, br: Vec3) {
    let normal = (bl - tl).cross(br - tl).normalize();
    let v = |p| Vertex::new(p, normal);

    mesh.push_triangle(v(tl), v(bl), v(br));
    mesh.push_triangle(v(tl), v(br), v(tr));
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;

    #[test]
    fn single_tile_cube_has_twelve_triangles() {
        let mesh = tessellate(ShapeParams::new(1, 3));
        assert_eq!(mesh.vertex_count(), 36);
    }

    #[test]
    fn three_by_three_tiles_per_face() {
        let mesh = tessellate(ShapeParams::new(3, 9));
        assert_eq!(mesh.vertex_count(), 324);
    }

    #[test]
    fn param2_is_ignored() {
        let a = tessellate(ShapeParams::new(2, 3));
        let b = tessellate(ShapeParams::new(2, 40));
        assert_eq!(a, b);
    }

    #[test]
    fn normals_are_axis_aligned_and_outward() {
        let mesh = tessellate(ShapeParams::new(4, 3));
        test_support::assert_normals_follow_faces(&mesh);

        for v in mesh.vertices() {
            let n = v.normal();
            let axis_components = n.to_array().iter().filter(|c| c.abs() > 0.5).count();
            assert_eq!(axis_components, 1, "normal {n:?} is not axis aligned");
            assert!(n.dot(v.position()) > 0.0);
        }
    }

    #[test]
    fn vertices_stay_on_the_unit_cube() {
        let mesh = tessellate(ShapeParams::new(5, 3));
        for v in mesh.vertices() {
            let p = v.position();
            assert!((p.abs().max_element() - 0.5).abs() < 1e-6, "{p:?} is off the surface");
        }
    }
}
