//! Capped cylinder of radius 0.5 spanning `y ∈ [-0.5, 0.5]`.

use glam::Vec3;

use super::{ShapeParams, Wedge, cap_slice, fraction, on_circle, wedges};
use crate::mesh::{Mesh, Vertex};

pub fn tessellate(params: ShapeParams) -> Mesh {
    let bands = params.param1();
    let mut mesh = Mesh::with_triangle_capacity((params.param2() * bands * 6) as usize);

    for wedge in wedges(params.param2()) {
        cap_slice(&mut mesh, bands, wedge, 0.5, true);
        cap_slice(&mut mesh, bands, wedge, -0.5, false);
        side_slice(&mut mesh, bands, wedge);
    }

    mesh
}

fn side_slice(mesh: &mut Mesh, bands: u32, wedge: Wedge) {
    let side = |theta: f32, y: f32| {
        Vertex::new(
            on_circle(0.5, theta, y),
            Vec3::new(theta.cos(), 0.0, theta.sin()),
        )
    };

    for i in 0..bands {
        let lower = -0.5 + fraction(i, bands);
        let upper = -0.5 + fraction(i + 1, bands);

        let tl = side(wedge.start, upper);
        let tr = side(wedge.end, upper);
        let bl = side(wedge.start, lower);
        let br = side(wedge.end, lower);

        mesh.push_triangle(tl, br, bl);
        mesh.push_triangle(tl, tr, br);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;

    #[test]
    fn triangle_count_is_six_per_band_per_wedge() {
        assert_eq!(tessellate(ShapeParams::new(1, 3)).triangle_count(), 18);
        assert_eq!(tessellate(ShapeParams::new(4, 10)).triangle_count(), 240);
    }

    #[test]
    fn side_normals_are_horizontal() {
        let mesh = tessellate(ShapeParams::new(3, 8));
        let mut sides = 0;
        for v in mesh.vertices() {
            let n = v.normal();
            if n.y == 0.0 {
                sides += 1;
                let radial = Vec3::new(v.position().x, 0.0, v.position().z).normalize();
                assert!(radial.dot(n) > 0.9999, "{n:?} is not radial");
            } else {
                assert!(n == Vec3::Y || n == Vec3::NEG_Y);
            }
        }
        assert_eq!(sides, 3 * 8 * 6);
    }

    #[test]
    fn caps_face_away_from_each_other() {
        let mesh = tessellate(ShapeParams::new(2, 6));
        test_support::assert_normals_follow_faces(&mesh);

        for v in mesh.vertices() {
            if v.normal() == Vec3::Y {
                assert_eq!(v.position().y, 0.5);
            } else if v.normal() == Vec3::NEG_Y {
                assert_eq!(v.position().y, -0.5);
            }
        }
    }

    #[test]
    fn bands_span_the_full_height() {
        let mesh = tessellate(ShapeParams::new(5, 4));
        let (lo, hi) = mesh
            .vertices()
            .iter()
            .map(|v| v.position().y)
            .fold((f32::MAX, f32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
        assert_eq!((lo, hi), (-0.5, 0.5));
    }
}
