//! The fixed showcase layout: ground, mirror, grid, card and lights.

use crate::materials::{PhongMaterial, StandardMaterial};
use crate::objects::{
    AmbientLight, Card, DirectionalLight, Ground, GridHelper, ObjectKind, PlaneGeometry, Reflector,
};
use crate::scene::Scene;
use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;
use vitrine_assets::Texture;
use vitrine_common::{Color, ObjectId, Transform, Viewport};

pub const CLEAR_COLOR: u32 = 0xffffff;

pub const GROUND_SIZE: f32 = 100_000.0;
pub const GROUND_SEGMENTS: u32 = 100;
pub const GROUND_Y: f32 = -99.9;
pub const REFLECTOR_Y: f32 = -100.0;
pub const REFLECTOR_COLOR: u32 = 0x777777;
pub const REFLECTOR_CLIP_BIAS: f32 = 0.003;

pub const GRID_SIZE: f32 = 10_000.0;
pub const GRID_DIVISIONS: u32 = 250;
pub const GRID_COLOR: u32 = 0xf2f2f2;
pub const GRID_Y: f32 = -99.0;

pub const CARD_WIDTH: f32 = 118.1;
pub const CARD_HEIGHT: f32 = 174.8;
pub const CARD_DEPTH: f32 = 0.1;
pub const CARD_POSITION: Vec3 = Vec3::new(0.0, 25.0, 0.0);
/// Initial yaw: three quarter turns.
pub const CARD_INITIAL_YAW: f32 = FRAC_PI_2 * 3.0;

/// Lights aim at the card's vertical midpoint.
pub const LIGHT_TARGET: Vec3 = Vec3::new(0.0, (CARD_HEIGHT + CARD_POSITION.y) / 2.0, 0.0);
pub const AMBIENT_INTENSITY: f32 = 0.1;

/// `(position, intensity)` of each directional light.
pub const DIRECTIONAL_LIGHTS: [(Vec3, f32); 3] = [
    (Vec3::new(100.0, 100.0, 100.0), 2.0),
    (Vec3::new(0.0, 100.0, 100.0), 1.0),
    (Vec3::new(100.0, 100.0, 0.0), 1.0),
];

/// Number of objects [`assemble`] adds.
pub const OBJECT_COUNT: usize = 8;

/// The assembled scene plus the ids the runner mutates later.
#[derive(Debug)]
pub struct AssembledScene {
    pub scene: Scene,
    pub card: ObjectId,
    pub reflector: ObjectId,
}

fn ground_geometry() -> PlaneGeometry {
    PlaneGeometry {
        width: GROUND_SIZE,
        height: GROUND_SIZE,
        width_segments: GROUND_SEGMENTS,
        height_segments: GROUND_SEGMENTS,
    }
}

fn lying_flat(y: f32) -> Transform {
    Transform::from_position(Vec3::new(0.0, y, 0.0)).with_rotation(Quat::from_rotation_x(-FRAC_PI_2))
}

/// Build the showcase scene.
///
/// `front` and `back` are decoded once and shared by the six card faces.
/// The mirror target is sized to `viewport` in device pixels.
pub fn assemble(viewport: Viewport, front: Texture, back: Texture) -> AssembledScene {
    let white = Color::from_hex(CLEAR_COLOR);
    let mut scene = Scene::new(white);

    let front = scene.add_texture(front);
    let back = scene.add_texture(back);
    let face = |map| PhongMaterial::textured(map).transparent();

    let card = scene.add(
        "card",
        Transform::from_position(CARD_POSITION).with_rotation(Quat::from_rotation_y(CARD_INITIAL_YAW)),
        ObjectKind::Card(Card {
            size: Vec3::new(CARD_WIDTH, CARD_HEIGHT, CARD_DEPTH),
            yaw: CARD_INITIAL_YAW,
            faces: [
                face(front),
                face(back),
                face(front),
                face(back),
                face(front).double_sided(),
                face(back).double_sided(),
            ],
        }),
    );

    for (i, (position, intensity)) in DIRECTIONAL_LIGHTS.into_iter().enumerate() {
        scene.add(
            format!("light_{i}"),
            Transform::from_position(position),
            ObjectKind::DirectionalLight(DirectionalLight {
                color: white,
                intensity,
                target: LIGHT_TARGET,
            }),
        );
    }

    let reflector = scene.add(
        "ground_reflector",
        lying_flat(REFLECTOR_Y),
        ObjectKind::Reflector(Reflector {
            geometry: ground_geometry(),
            color: Color::from_hex(REFLECTOR_COLOR),
            clip_bias: REFLECTOR_CLIP_BIAS,
            texture_size: viewport.physical_size(),
        }),
    );

    let grid_color = Color::from_hex(GRID_COLOR);
    scene.add(
        "grid",
        Transform::from_position(Vec3::new(0.0, GRID_Y, 0.0)),
        ObjectKind::Grid(GridHelper {
            size: GRID_SIZE,
            divisions: GRID_DIVISIONS,
            center_color: grid_color,
            line_color: grid_color,
        }),
    );

    scene.add(
        "ambient",
        Transform::default(),
        ObjectKind::AmbientLight(AmbientLight {
            color: white,
            intensity: AMBIENT_INTENSITY,
        }),
    );

    scene.add(
        "ground",
        lying_flat(GROUND_Y),
        ObjectKind::Ground(Ground {
            geometry: ground_geometry(),
            material: StandardMaterial {
                color: white,
                metalness: 0.9,
                roughness: 0.25,
                opacity: 0.95,
                transparent: true,
            },
        }),
    );

    tracing::info!(objects = scene.object_count(), "scene assembled");
    AssembledScene {
        scene,
        card,
        reflector,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::Side;
    use crate::scene::Background;
    use std::f32::consts::PI;
    use std::sync::Arc;

    fn assembled() -> AssembledScene {
        assemble(
            Viewport::new(800.0, 600.0, 2.0),
            Texture::solid("front", [255, 0, 0, 255]),
            Texture::solid("back", [0, 0, 255, 255]),
        )
    }

    #[test]
    fn assembles_eight_objects() {
        let a = assembled();
        assert_eq!(a.scene.object_count(), OBJECT_COUNT);
        let labels: Vec<_> = a.scene.objects().iter().map(|o| o.kind.label()).collect();
        assert_eq!(
            labels,
            [
                "card",
                "directional_light",
                "directional_light",
                "directional_light",
                "reflector",
                "grid",
                "ambient_light",
                "ground",
            ]
        );
    }

    #[test]
    fn card_layout() {
        let a = assembled();
        let card = a.scene.card(a.card).unwrap();
        assert_eq!(card.size, Vec3::new(118.1, 174.8, 0.1));
        assert!((card.yaw - 3.0 * PI / 2.0).abs() < 1e-6);
        assert_eq!(a.scene.get(a.card).unwrap().transform.position, Vec3::new(0.0, 25.0, 0.0));
    }

    #[test]
    fn card_faces_share_two_textures() {
        let a = assembled();
        let card = a.scene.card(a.card).unwrap();
        let maps: Vec<u32> = card.faces.iter().map(|f| f.map.0).collect();
        assert_eq!(maps, [0, 1, 0, 1, 0, 1]);
        assert_eq!(a.scene.textures().len(), 2);
        assert!(card.faces.iter().all(|f| f.transparent));
        assert_eq!(card.faces[4].side, Side::Double);
        assert_eq!(card.faces[5].side, Side::Double);
        assert_eq!(card.faces[0].side, Side::Front);
        let front = a.scene.texture(card.faces[0].map).unwrap();
        let again = a.scene.texture(card.faces[2].map).unwrap();
        assert!(Arc::ptr_eq(front, again));
    }

    #[test]
    fn reflector_matches_viewport_in_device_pixels() {
        let a = assembled();
        let obj = a.scene.get(a.reflector).unwrap();
        let ObjectKind::Reflector(r) = obj.kind else {
            panic!("not a reflector");
        };
        assert_eq!(r.texture_size, (1600, 1200));
        assert_eq!(r.clip_bias, 0.003);
        assert_eq!(obj.transform.position.y, -100.0);
    }

    #[test]
    fn planes_and_grid_heights() {
        let a = assembled();
        let y_of = |label: &str| {
            a.scene
                .objects()
                .iter()
                .find(|o| o.kind.label() == label)
                .map(|o| o.transform.position.y)
                .unwrap()
        };
        assert_eq!(y_of("ground"), -99.9);
        assert_eq!(y_of("reflector"), -100.0);
        assert_eq!(y_of("grid"), -99.0);
    }

    #[test]
    fn lights_aim_at_card_midpoint() {
        let a = assembled();
        let lights: Vec<_> = a.scene.directional_lights().collect();
        assert_eq!(lights.len(), 3);
        for (_, light) in &lights {
            assert!((light.target.y - 99.9).abs() < 1e-4);
        }
        let intensities: Vec<f32> = lights.iter().map(|(_, l)| l.intensity).collect();
        assert_eq!(intensities, [2.0, 1.0, 1.0]);
        assert!((a.scene.ambient()[0] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn starts_on_white_background() {
        let a = assembled();
        assert_eq!(a.scene.background(), Background::Color(Color::WHITE));
    }

    #[test]
    fn serializes_for_inspection() {
        let a = assembled();
        let json = serde_json::to_value(a.scene.objects()).unwrap();
        assert_eq!(json[0]["kind"]["type"], "card");
        assert_eq!(json[7]["name"], "ground");
    }
}
