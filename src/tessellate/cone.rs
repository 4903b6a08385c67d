//! Cone with its base disk at `y = -0.5` and apex at `y = 0.5`.
//!
//! The lateral surface is `x² + z² = (0.5 · (0.5 - y))²`, split into `param1`
//! bands from base to apex and `param2` wedges around Y. Normals off the apex
//! are the normalized gradient of that implicit surface; the apex has no
//! gradient, so its normal is taken along the wedge's mid-angle instead.

use glam::Vec3;

use super::{ShapeParams, Wedge, cap_slice, fraction, on_circle, wedges};
use crate::mesh::{Mesh, Vertex};

pub fn tessellate(params: ShapeParams) -> Mesh {
    let bands = params.param1();
    let mut mesh = Mesh::with_triangle_capacity((params.param2() * bands * 4) as usize);

    for wedge in wedges(params.param2()) {
        cap_slice(&mut mesh, bands, wedge, -0.5, false);
        slope_slice(&mut mesh, bands, wedge);
    }

    mesh
}

fn slope_slice(mesh: &mut Mesh, bands: u32, wedge: Wedge) {
    let ring = |j: u32, theta: f32| {
        let t = fraction(j, bands);
        let position = on_circle(0.5 * (1.0 - t), theta, -0.5 + t);
        let normal = if j == bands {
            apex_normal(wedge.mid)
        } else {
            slope_normal(position)
        };
        Vertex::new(position, normal)
    };

    for i in 0..bands {
        let a0 = ring(i, wedge.start);
        let a1 = ring(i, wedge.end);
        let b0 = ring(i + 1, wedge.start);
        let b1 = ring(i + 1, wedge.end);

        mesh.push_triangle(a0, b0, b1);
        mesh.push_triangle(a0, b1, a1);
    }
}

fn slope_normal(p: Vec3) -> Vec3 {
    Vec3::new(2.0 * p.x, 0.5 * (0.5 - p.y), 2.0 * p.z).normalize()
}

fn apex_normal(theta: f32) -> Vec3 {
    Vec3::new(theta.cos(), 1.0, theta.sin()).normalize()
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn triangle_count_is_four_per_band_per_wedge() {
        for (p1, p2) in [(1, 3), (3, 8), (5, 12)] {
            let mesh = tessellate(ShapeParams::new(p1, p2));
            assert_eq!(mesh.triangle_count(), (4 * p1 * p2) as usize);
        }
    }

    #[test]
    fn apex_normals_are_finite_and_tilted_up() {
        let mesh = tessellate(ShapeParams::new(4, 6));
        let apex: Vec<_> = mesh
            .vertices()
            .iter()
            .filter(|v| v.position().y == 0.5)
            .collect();

        assert!(!apex.is_empty());
        for v in apex {
            let n = v.normal();
            assert!(n.is_finite());
            assert_relative_eq!(n.length(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(n.y, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-5);
        }
    }

    #[test]
    fn base_faces_down() {
        let mesh = tessellate(ShapeParams::new(2, 5));
        let base = mesh
            .triangles()
            .filter(|t| t.iter().all(|v| v.position().y == -0.5 && v.normal() == Vec3::NEG_Y));
        assert_eq!(base.count(), 2 * 2 * 5);
    }

    #[test]
    fn slope_normals_match_the_surface_gradient() {
        let mesh = tessellate(ShapeParams::new(3, 7));
        test_support::assert_normals_follow_faces(&mesh);

        for v in mesh.vertices() {
            let (p, n) = (v.position(), v.normal());
            if p.y > -0.5 && p.y < 0.5 {
                // Lateral normals lean up by a fixed slope of 1:2 against the radial direction.
                let radial = Vec3::new(n.x, 0.0, n.z).length();
                assert_relative_eq!(n.y / radial, 0.5, epsilon = 1e-4);
            }
        }
    }
}
