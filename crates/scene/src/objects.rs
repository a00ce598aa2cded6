use crate::materials::{PhongMaterial, StandardMaterial};
use glam::Vec3;
use serde::Serialize;
use vitrine_common::{Color, ObjectId, Transform};

/// One renderable object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    pub kind: ObjectKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Ground(Ground),
    Reflector(Reflector),
    Grid(GridHelper),
    Card(Card),
    DirectionalLight(DirectionalLight),
    AmbientLight(AmbientLight),
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Ground(_) => "ground",
            ObjectKind::Reflector(_) => "reflector",
            ObjectKind::Grid(_) => "grid",
            ObjectKind::Card(_) => "card",
            ObjectKind::DirectionalLight(_) => "directional_light",
            ObjectKind::AmbientLight(_) => "ambient_light",
        }
    }
}

/// Flat rectangle in its local XY plane, facing +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ground {
    pub geometry: PlaneGeometry,
    pub material: StandardMaterial,
}

/// Planar mirror. Renders the scene from a mirrored camera into an
/// offscreen target of `texture_size` device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reflector {
    pub geometry: PlaneGeometry,
    pub color: Color,
    pub clip_bias: f32,
    pub texture_size: (u32, u32),
}

/// Square line grid in the local XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridHelper {
    pub size: f32,
    pub divisions: u32,
    pub center_color: Color,
    pub line_color: Color,
}

impl GridHelper {
    /// Distance between neighbouring lines.
    pub fn step(&self) -> f32 {
        self.size / self.divisions.max(1) as f32
    }
}

/// Thin box with one material per face, ordered +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Card {
    pub size: Vec3,
    pub yaw: f32,
    pub faces: [PhongMaterial; 6],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub target: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the target toward a light at `position`.
    pub fn direction_from(&self, position: Vec3) -> Vec3 {
        (position - self.target).try_normalize().unwrap_or(Vec3::Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_step_divides_size() {
        let grid = GridHelper {
            size: 10000.0,
            divisions: 250,
            center_color: Color::WHITE,
            line_color: Color::WHITE,
        };
        assert_eq!(grid.step(), 40.0);
    }

    #[test]
    fn light_direction_points_at_light() {
        let light = DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            target: Vec3::new(0.0, 100.0, 0.0),
        };
        let dir = light.direction_from(Vec3::new(0.0, 100.0, 50.0));
        assert!((dir - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn degenerate_light_falls_back_to_up() {
        let light = DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            target: Vec3::ONE,
        };
        assert_eq!(light.direction_from(Vec3::ONE), Vec3::Y);
    }
}
