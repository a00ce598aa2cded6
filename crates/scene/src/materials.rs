use serde::Serialize;
use vitrine_common::Color;

/// Index into the scene's texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextureHandle(pub u32);

/// Which faces of a surface are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Metallic/roughness material, reflects the scene environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StandardMaterial {
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
        }
    }
}

/// Textured Blinn-Phong material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhongMaterial {
    pub map: TextureHandle,
    pub side: Side,
    pub transparent: bool,
    pub specular: Color,
    pub shininess: f32,
}

impl PhongMaterial {
    pub fn textured(map: TextureHandle) -> Self {
        Self {
            map,
            side: Side::Front,
            transparent: false,
            specular: Color::from_hex(0x111111),
            shininess: 30.0,
        }
    }

    pub fn transparent(self) -> Self {
        Self {
            transparent: true,
            ..self
        }
    }

    pub fn double_sided(self) -> Self {
        Self {
            side: Side::Double,
            ..self
        }
    }
}
