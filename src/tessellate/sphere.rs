//! Latitude/longitude sphere of radius 0.5.
//!
//! `param1` is the number of latitude rows from pole to pole (never fewer than
//! two) and `param2` the number of longitude wedges. Normals are the normalized
//! positions.

use std::f32::consts::PI;

use glam::Vec3;

use super::{ShapeParams, fraction, wedges};
use crate::mesh::{Mesh, Vertex};

const RADIUS: f32 = 0.5;

pub fn tessellate(params: ShapeParams) -> Mesh {
    let rows = params.param1().max(2);
    let mut mesh = Mesh::with_triangle_capacity((rows * params.param2() * 2) as usize);

    let point = |phi: f32, theta: f32| {
        let p = Vec3::new(
            RADIUS * phi.sin() * theta.cos(),
            RADIUS * phi.cos(),
            -RADIUS * phi.sin() * theta.sin(),
        );
        Vertex::new(p, p.normalize())
    };

    for wedge in wedges(params.param2()) {
        for row in 0..rows {
            let phi0 = PI * fraction(row, rows);
            let phi1 = PI * fraction(row + 1, rows);

            let tl = point(phi0, wedge.start);
            let tr = point(phi0, wedge.end);
            let bl = point(phi1, wedge.start);
            let br = point(phi1, wedge.end);

            mesh.push_triangle(tl, bl, br);
            mesh.push_triangle(tl, br, tr);
        }
    }

    mesh
}
