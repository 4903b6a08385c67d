//! JSON scene files.
//!
//! The file format mirrors [`RenderData`] with plain arrays in place of vector
//! types. Every section and most fields are optional and fall back to the
//! defaults of the corresponding data type.

use std::path::Path;

use glam::{Mat4, Vec3};
use serde::Deserialize;

use super::data::{CameraData, GlobalData, Light, LightKind, Material, RenderData, RenderShape};
use crate::error::SceneError;
use crate::mesh::Transform;
use crate::tessellate::PrimitiveKind;

#[derive(Deserialize, Default)]
#[serde(default)]
struct SceneFile {
    camera: CameraFile,
    global: GlobalFile,
    shapes: Vec<ShapeFile>,
    lights: Vec<LightFile>,
}

#[derive(Deserialize)]
#[serde(default)]
struct CameraFile {
    position: [f32; 3],
    look: [f32; 3],
    up: [f32; 3],
    height_angle: f32,
}

impl Default for CameraFile {
    fn default() -> Self {
        let camera = CameraData::default();
        Self {
            position: camera.position.to_array(),
            look: camera.look.to_array(),
            up: camera.up.to_array(),
            height_angle: camera.height_angle,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct GlobalFile {
    ka: f32,
    kd: f32,
    ks: f32,
}

impl Default for GlobalFile {
    fn default() -> Self {
        let global = GlobalData::default();
        Self {
            ka: global.ka,
            kd: global.kd,
            ks: global.ks,
        }
    }
}

#[derive(Deserialize)]
struct ShapeFile {
    primitive: PrimitiveKind,
    #[serde(default)]
    transform: Option<TransformFile>,
    /// Column-major object-to-world matrix.
    #[serde(default)]
    matrix: Option<[f32; 16]>,
    #[serde(default)]
    material: MaterialFile,
}

#[derive(Deserialize)]
#[serde(default)]
struct TransformFile {
    translate: [f32; 3],
    /// Axis followed by an angle in degrees.
    rotate: [f32; 4],
    scale: [f32; 3],
}

impl Default for TransformFile {
    fn default() -> Self {
        Self {
            translate: [0.0; 3],
            rotate: [0.0, 1.0, 0.0, 0.0],
            scale: [1.0; 3],
        }
    }
}

impl TransformFile {
    fn matrix(&self) -> Mat4 {
        let [x, y, z, degrees] = self.rotate;
        Transform::new()
            .position(Vec3::from(self.translate))
            .axis_angle_degrees(Vec3::new(x, y, z), degrees)
            .scale(Vec3::from(self.scale))
            .matrix()
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct MaterialFile {
    ambient: [f32; 3],
    diffuse: [f32; 3],
    specular: [f32; 3],
    shininess: f32,
    emissive: [f32; 3],
}

impl Default for MaterialFile {
    fn default() -> Self {
        let material = Material::default();
        Self {
            ambient: material.ambient.to_array(),
            diffuse: material.diffuse.to_array(),
            specular: material.specular.to_array(),
            shininess: material.shininess,
            emissive: material.emissive.to_array(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct LightFile {
    #[serde(rename = "type")]
    kind: LightKind,
    color: [f32; 3],
    position: [f32; 3],
    direction: [f32; 3],
    attenuation: [f32; 3],
    angle: f32,
    penumbra: f32,
}

impl Default for LightFile {
    fn default() -> Self {
        let light = Light::default();
        Self {
            kind: light.kind,
            color: light.color.to_array(),
            position: light.position.to_array(),
            direction: light.direction.to_array(),
            attenuation: light.attenuation.to_array(),
            angle: light.angle,
            penumbra: light.penumbra,
        }
    }
}

/// Reads and parses the scene file at `path`.
pub fn load_scene(path: impl AsRef<Path>) -> Result<RenderData, SceneError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scene(&json)
}

/// Parses a scene from JSON text.
pub fn parse_scene(json: &str) -> Result<RenderData, SceneError> {
    let file: SceneFile = serde_json::from_str(json)?;

    let camera = CameraData {
        position: Vec3::from(file.camera.position),
        look: Vec3::from(file.camera.look),
        up: Vec3::from(file.camera.up),
        height_angle: file.camera.height_angle,
    };
    if camera.look.cross(camera.up).length_squared() < 1e-12 {
        return Err(SceneError::Invalid(
            "camera look and up must be non-zero and not parallel".into(),
        ));
    }
    if !(camera.height_angle > 0.0 && camera.height_angle < std::f32::consts::PI) {
        return Err(SceneError::Invalid(format!(
            "camera height_angle {} is outside (0, pi)",
            camera.height_angle
        )));
    }

    let shapes = file
        .shapes
        .into_iter()
        .enumerate()
        .map(|(i, shape)| {
            let ctm = match (&shape.transform, &shape.matrix) {
                (Some(_), Some(_)) => {
                    return Err(SceneError::Invalid(format!(
                        "shape {i} gives both a transform and a matrix"
                    )));
                }
                (Some(transform), None) => transform.matrix(),
                (None, Some(cols)) => Mat4::from_cols_array(cols),
                (None, None) => Mat4::IDENTITY,
            };
            Ok(RenderShape {
                primitive: shape.primitive,
                ctm,
                material: Material {
                    ambient: Vec3::from(shape.material.ambient),
                    diffuse: Vec3::from(shape.material.diffuse),
                    specular: Vec3::from(shape.material.specular),
                    shininess: shape.material.shininess,
                    emissive: Vec3::from(shape.material.emissive),
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let lights = file
        .lights
        .into_iter()
        .enumerate()
        .map(|(i, light)| {
            let direction = Vec3::from(light.direction);
            let aimed = matches!(light.kind, LightKind::Directional | LightKind::Spot);
            if aimed && direction.length_squared() < 1e-12 {
                return Err(SceneError::Invalid(format!(
                    "light {i} is {:?} but its direction is zero",
                    light.kind
                )));
            }
            Ok(Light {
                kind: light.kind,
                color: Vec3::from(light.color),
                position: Vec3::from(light.position),
                direction,
                attenuation: Vec3::from(light.attenuation),
                angle: light.angle,
                penumbra: light.penumbra,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderData {
        camera,
        global: GlobalData {
            ka: file.global.ka,
            kd: file.global.kd,
            ks: file.global.ks,
        },
        shapes,
        lights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const SCENE: &str = r#"{
        "camera": { "position": [0, 1, 6], "look": [0, 0, -1], "up": [0, 1, 0], "height_angle": 0.6 },
        "global": { "ka": 0.2, "kd": 0.9, "ks": 0.4 },
        "shapes": [
            { "primitive": "sphere",
              "transform": { "translate": [1, 0, 0], "rotate": [0, 1, 0, 90], "scale": [2, 2, 2] },
              "material": { "diffuse": [1, 0, 0], "specular": [1, 1, 1], "shininess": 25 } },
            { "primitive": "cone" }
        ],
        "lights": [
            { "type": "directional", "color": [1, 1, 1], "direction": [0, -1, -1] },
            { "type": "spot", "position": [0, 3, 0], "angle": 0.4, "penumbra": 0.1,
              "attenuation": [1, 0.1, 0.01] }
        ]
    }"#;

    #[test]
    fn parses_a_full_scene() {
        let scene = parse_scene(SCENE).unwrap();

        assert_eq!(scene.camera.position, Vec3::new(0.0, 1.0, 6.0));
        assert_relative_eq!(scene.camera.height_angle, 0.6);
        assert_relative_eq!(scene.global.kd, 0.9);

        assert_eq!(scene.shapes.len(), 2);
        assert_eq!(scene.shapes[0].primitive, PrimitiveKind::Sphere);
        assert_eq!(scene.shapes[0].material.diffuse, Vec3::X);
        assert_relative_eq!(scene.shapes[0].material.shininess, 25.0);
        assert_eq!(scene.shapes[1].ctm, Mat4::IDENTITY);
        assert_eq!(scene.shapes[1].material, Material::default());

        assert_eq!(scene.lights[0].kind, LightKind::Directional);
        assert_eq!(scene.lights[1].kind, LightKind::Spot);
        assert_eq!(scene.lights[1].attenuation, Vec3::new(1.0, 0.1, 0.01));
    }

    #[test]
    fn transform_matches_the_builder() {
        let scene = parse_scene(SCENE).unwrap();
        let expected = Transform::new()
            .position(Vec3::X)
            .rotation(glam::Quat::from_rotation_y(90f32.to_radians()))
            .uniform_scale(2.0)
            .matrix();
        assert!(scene.shapes[0].ctm.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn accepts_a_raw_matrix() {
        let json = r#"{ "shapes": [ { "primitive": "cube",
            "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 3,4,5,1] } ] }"#;
        let scene = parse_scene(json).unwrap();
        assert_eq!(scene.shapes[0].ctm.w_axis.truncate(), Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn empty_object_is_an_empty_scene() {
        let scene = parse_scene("{}").unwrap();
        assert!(scene.shapes.is_empty());
        assert!(scene.lights.is_empty());
        assert_eq!(scene.camera, CameraData::default());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(parse_scene("{ nope"), Err(SceneError::Parse(_))));
        assert!(matches!(
            parse_scene(r#"{ "shapes": [ { "primitive": "torus" } ] }"#),
            Err(SceneError::Parse(_))
        ));
        assert!(matches!(
            parse_scene(r#"{ "camera": { "look": [0, 1, 0], "up": [0, 2, 0] } }"#),
            Err(SceneError::Invalid(_))
        ));
        assert!(matches!(
            parse_scene(r#"{ "shapes": [ { "primitive": "cube", "transform": {},
                "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1] } ] }"#),
            Err(SceneError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_aimed_lights_without_a_direction() {
        for kind in ["directional", "spot"] {
            let json = format!(r#"{{ "lights": [ {{ "type": "{kind}", "direction": [0, 0, 0] }} ] }}"#);
            assert!(
                matches!(parse_scene(&json), Err(SceneError::Invalid(_))),
                "{kind} light with a zero direction was accepted"
            );
        }

        // A point light never reads its direction.
        let point = parse_scene(r#"{ "lights": [ { "type": "point", "direction": [0, 0, 0] } ] }"#).unwrap();
        assert_eq!(point.lights[0].direction, Vec3::ZERO);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENE.as_bytes()).unwrap();

        let scene = load_scene(file.path()).unwrap();
        assert_eq!(scene.shapes.len(), 2);

        let missing = load_scene(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(SceneError::Io { .. })));
    }
}
