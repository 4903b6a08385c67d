//! Procedural tessellation of the four parametric solids.
//!
//! Every primitive is a pure function with the same signature,
//! `fn(ShapeParams) -> Mesh`, selected through [`PrimitiveKind`]. All solids are
//! centered at the origin and fit the unit cube `[-0.5, 0.5]³`.
//!
//! | Kind       | `param1`                       | `param2`        |
//! |------------|--------------------------------|-----------------|
//! | Cube       | tiles per face edge            | unused          |
//! | Cone       | cap rings / lateral bands      | wedges around Y |
//! | Cylinder   | cap rings / lateral bands      | wedges around Y |
//! | Sphere     | latitude rows (at least 2)     | wedges around Y |
//!
//! Calling [`PrimitiveKind::tessellate`] twice with equal [`ShapeParams`] yields
//! byte-identical vertex streams.
//!
//! ```
//! use lumen::{PrimitiveKind, ShapeParams};
//!
//! let mesh = PrimitiveKind::Cube.tessellate(ShapeParams::new(3, 3));
//! assert_eq!(mesh.vertex_count(), 324);
//! ```

pub mod cone;
pub mod cube;
pub mod cylinder;
pub mod sphere;

use std::f32::consts::TAU;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::{Mesh, Vertex};

/// Resolution parameters shared by every primitive, clamped on construction.
///
/// `param1` is at least 1 and `param2` at least 3. Clamping an already clamped
/// pair returns the same pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeParams {
    param1: u32,
    param2: u32,
}

impl ShapeParams {
    pub const MIN_PARAM1: u32 = 1;
    pub const MIN_PARAM2: u32 = 3;

    /// Clamps raw configuration values into the valid range.
    pub fn new(param1: i32, param2: i32) -> Self {
        Self {
            param1: param1.max(Self::MIN_PARAM1 as i32) as u32,
            param2: param2.max(Self::MIN_PARAM2 as i32) as u32,
        }
    }

    pub fn param1(&self) -> u32 {
        self.param1
    }

    pub fn param2(&self) -> u32 {
        self.param2
    }
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            param1: Self::MIN_PARAM1,
            param2: Self::MIN_PARAM2,
        }
    }
}

/// The primitive solids a scene can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Cube,
    Cone,
    Cylinder,
    Sphere,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::Cube,
        PrimitiveKind::Cone,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Sphere,
    ];

    /// Builds the triangle list for this primitive.
    pub fn tessellate(self, params: ShapeParams) -> Mesh {
        match self {
            PrimitiveKind::Cube => cube::tessellate(params),
            PrimitiveKind::Cone => cone::tessellate(params),
            PrimitiveKind::Cylinder => cylinder::tessellate(params),
            PrimitiveKind::Sphere => sphere::tessellate(params),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Cube => "cube",
            PrimitiveKind::Cone => "cone",
            PrimitiveKind::Cylinder => "cylinder",
            PrimitiveKind::Sphere => "sphere",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One angular slice of a surface of revolution around the Y axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Wedge {
    pub start: f32,
    pub end: f32,
    /// Angle halfway through the slice.
    pub mid: f32,
}

/// Splits the full turn into `count` wedges.
///
/// The last wedge ends on exactly the angle the first one starts at, so the
/// seam vertices are bit-identical and the surface closes.
pub(crate) fn wedges(count: u32) -> impl Iterator<Item = Wedge> {
    let step = TAU / count as f32;
    (0..count).map(move |k| {
        let start = k as f32 * step;
        Wedge {
            start,
            end: ((k + 1) % count) as f32 * step,
            mid: start + 0.5 * step,
        }
    })
}

/// Point at `radius` and angle `theta` on the horizontal plane at height `y`.
pub(crate) fn on_circle(radius: f32, theta: f32, y: f32) -> Vec3 {
    Vec3::new(radius * theta.cos(), y, radius * theta.sin())
}

/// Fraction `i / n` along a subdivided span, exact at both ends.
pub(crate) fn fraction(i: u32, n: u32) -> f32 {
    i as f32 / n as f32
}

/// Emits one wedge of a flat disk of radius 0.5 at height `y`, split into `rings`
/// concentric segments. `up` selects a +Y facing (top) or -Y facing (bottom) cap.
pub(crate) fn cap_slice(mesh: &mut Mesh, rings: u32, wedge: Wedge, y: f32, up: bool) {
    let normal = if up { Vec3::Y } else { Vec3::NEG_Y };

    for i in 0..rings {
        let r0 = fraction(i, rings) * 0.5;
        let r1 = fraction(i + 1, rings) * 0.5;

        let i0 = Vertex::new(on_circle(r0, wedge.start, y), normal);
        let i1 = Vertex::new(on_circle(r0, wedge.end, y), normal);
        let o0 = Vertex::new(on_circle(r1, wedge.start, y), normal);
        let o1 = Vertex::new(on_circle(r1, wedge.end, y), normal);

        if up {
            mesh.push_triangle(i0, o1, o0);
            mesh.push_triangle(i0, i1, o1);
        } else {
            mesh.push_triangle(i0, o0, o1);
            mesh.push_triangle(i0, o1, i1);
        }
    }
}
