use glam::{Mat4, Vec3};
use serde::Deserialize;

use crate::tessellate::PrimitiveKind;

/// Everything the renderer needs to draw one scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderData {
    pub camera: CameraData,
    pub global: GlobalData,
    pub shapes: Vec<RenderShape>,
    /// Every light in the scene. The renderer uses at most
    /// [`crate::render::MAX_LIGHTS`] of them.
    pub lights: Vec<Light>,
}

/// Initial camera pose and field of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraData {
    pub position: Vec3,
    pub look: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub height_angle: f32,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            look: Vec3::NEG_Z,
            up: Vec3::Y,
            height_angle: std::f32::consts::FRAC_PI_4,
        }
    }
}

/// Scene-wide weights for the ambient, diffuse, and specular terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobalData {
    pub ka: f32,
    pub kd: f32,
    pub ks: f32,
}

impl Default for GlobalData {
    fn default() -> Self {
        Self {
            ka: 0.5,
            kd: 0.5,
            ks: 0.5,
        }
    }
}

/// Surface reflectance of one shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub emissive: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec3::ZERO,
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ZERO,
            shininess: 1.0,
            emissive: Vec3::ZERO,
        }
    }
}

/// One primitive placed in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderShape {
    pub primitive: PrimitiveKind,
    /// Object-to-world transform.
    pub ctm: Mat4,
    pub material: Material,
}

/// Light source kinds, numbered as the lighting shader expects them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    #[default]
    Point,
    Directional,
    Spot,
}

impl LightKind {
    /// The integer the lighting shader switches on.
    pub fn code(self) -> u32 {
        match self {
            LightKind::Point => 0,
            LightKind::Directional => 1,
            LightKind::Spot => 2,
        }
    }
}

/// A light source. Fields a kind does not use are ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    /// Constant, linear, and quadratic distance falloff.
    pub attenuation: Vec3,
    /// Spot cone half-angle in radians.
    pub angle: f32,
    /// Width of the spot's soft edge in radians, measured inward from `angle`.
    pub penumbra: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::ONE,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            angle: 0.5,
            penumbra: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_codes_match_the_shader() {
        assert_eq!(LightKind::Point.code(), 0);
        assert_eq!(LightKind::Directional.code(), 1);
        assert_eq!(LightKind::Spot.code(), 2);
    }
}
