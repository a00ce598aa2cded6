use crate::materials::TextureHandle;
use crate::objects::{AmbientLight, Card, DirectionalLight, ObjectKind, SceneObject};
use glam::Quat;
use std::sync::Arc;
use vitrine_assets::{EnvironmentMap, Texture};
use vitrine_common::{Color, ObjectId, Transform};

/// What fills the screen behind the objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Color(Color),
    /// The scene environment, drawn as a panorama.
    Environment,
}

/// The scene graph.
///
/// Objects are stored in insertion order and there is no removal path.
/// Textures live in a table referenced by handle so one decoded image can
/// back several materials.
#[derive(Debug)]
pub struct Scene {
    objects: Vec<SceneObject>,
    textures: Vec<Arc<Texture>>,
    background: Background,
    environment: Option<Arc<EnvironmentMap>>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            objects: Vec::new(),
            textures: Vec::new(),
            background: Background::Color(background),
            environment: None,
        }
    }

    /// Add an object. Returns its id.
    pub fn add(&mut self, name: impl Into<String>, transform: Transform, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        let name = name.into();
        tracing::debug!(id = id.0, %name, kind = kind.label(), "object added");
        self.objects.push(SceneObject {
            id,
            name,
            transform,
            kind,
        });
        id
    }

    /// Register a decoded texture. Returns the handle materials refer to.
    pub fn add_texture(&mut self, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(Arc::new(texture));
        handle
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Arc<Texture>> {
        self.textures.get(handle.0 as usize)
    }

    pub fn textures(&self) -> &[Arc<Texture>] {
        &self.textures
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0 as usize)
    }

    pub fn background(&self) -> Background {
        self.background
    }

    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        self.environment.as_ref()
    }

    /// Use `environment` for reflections and as the background.
    pub fn set_environment(&mut self, environment: Arc<EnvironmentMap>) {
        self.environment = Some(environment);
        self.background = Background::Environment;
    }

    pub fn card(&self, id: ObjectId) -> Option<&Card> {
        match self.get(id).map(|o| &o.kind) {
            Some(ObjectKind::Card(card)) => Some(card),
            _ => None,
        }
    }

    /// Turn a card about the vertical axis. Returns the new yaw, or `None`
    /// when `id` is not a card.
    pub fn rotate_card(&mut self, id: ObjectId, delta: f32) -> Option<f32> {
        let object = self.objects.get_mut(id.0 as usize)?;
        let ObjectKind::Card(card) = &mut object.kind else {
            return None;
        };
        card.yaw += delta;
        object.transform.rotation = Quat::from_rotation_y(card.yaw);
        Some(card.yaw)
    }

    /// Resize a reflector's offscreen target. Returns false when `id` is not
    /// a reflector.
    pub fn set_reflector_texture_size(&mut self, id: ObjectId, size: (u32, u32)) -> bool {
        match self.objects.get_mut(id.0 as usize).map(|o| &mut o.kind) {
            Some(ObjectKind::Reflector(reflector)) => {
                reflector.texture_size = (size.0.max(1), size.1.max(1));
                true
            }
            _ => false,
        }
    }

    /// Directional lights with their world positions.
    pub fn directional_lights(&self) -> impl Iterator<Item = (&Transform, &DirectionalLight)> {
        self.objects.iter().filter_map(|o| match &o.kind {
            ObjectKind::DirectionalLight(light) => Some((&o.transform, light)),
            _ => None,
        })
    }

    /// Sum of all ambient lights, as linear color times intensity.
    pub fn ambient(&self) -> [f32; 3] {
        self.objects
            .iter()
            .filter_map(|o| match &o.kind {
                ObjectKind::AmbientLight(AmbientLight { color, intensity }) => {
                    let c = color.to_linear();
                    Some([c[0] * intensity, c[1] * intensity, c[2] * intensity])
                }
                _ => None,
            })
            .fold([0.0; 3], |acc, c| [acc[0] + c[0], acc[1] + c[1], acc[2] + c[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::PhongMaterial;
    use crate::objects::GridHelper;
    use glam::Vec3;
    use vitrine_assets::Mapping;

    fn card_kind(handle: TextureHandle) -> ObjectKind {
        ObjectKind::Card(Card {
            size: Vec3::new(1.0, 2.0, 0.1),
            yaw: 0.0,
            faces: [PhongMaterial::textured(handle); 6],
        })
    }

    fn grid_kind() -> ObjectKind {
        ObjectKind::Grid(GridHelper {
            size: 10.0,
            divisions: 10,
            center_color: Color::WHITE,
            line_color: Color::WHITE,
        })
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut scene = Scene::new(Color::WHITE);
        let a = scene.add("grid", Transform::default(), grid_kind());
        let b = scene.add("grid2", Transform::default(), grid_kind());
        assert_eq!((a, b), (ObjectId(0), ObjectId(1)));
        assert_eq!(scene.object_count(), 2);
        assert_eq!(scene.get(b).unwrap().name, "grid2");
    }

    #[test]
    fn rotate_card_updates_yaw_and_transform() {
        let mut scene = Scene::new(Color::WHITE);
        let tex = scene.add_texture(Texture::solid("t", [0, 0, 0, 255]));
        let id = scene.add("card", Transform::default(), card_kind(tex));
        assert_eq!(scene.rotate_card(id, 0.5), Some(0.5));
        assert_eq!(scene.rotate_card(id, 0.25), Some(0.75));
        let rot = scene.get(id).unwrap().transform.rotation;
        assert!(rot.abs_diff_eq(Quat::from_rotation_y(0.75), 1e-6));
    }

    #[test]
    fn rotate_non_card_is_rejected() {
        let mut scene = Scene::new(Color::WHITE);
        let id = scene.add("grid", Transform::default(), grid_kind());
        assert_eq!(scene.rotate_card(id, 1.0), None);
        assert_eq!(scene.rotate_card(ObjectId(99), 1.0), None);
    }

    #[test]
    fn environment_replaces_background() {
        let mut scene = Scene::new(Color::WHITE);
        assert_eq!(scene.background(), Background::Color(Color::WHITE));
        assert!(scene.environment().is_none());
        scene.set_environment(Arc::new(EnvironmentMap {
            width: 1,
            height: 1,
            texels: vec![1.0; 4],
            mapping: Mapping::EquirectangularReflection,
        }));
        assert_eq!(scene.background(), Background::Environment);
        assert!(scene.environment().is_some());
    }

    #[test]
    fn ambient_sums_intensities() {
        let mut scene = Scene::new(Color::WHITE);
        for _ in 0..2 {
            scene.add(
                "ambient",
                Transform::default(),
                ObjectKind::AmbientLight(AmbientLight {
                    color: Color::WHITE,
                    intensity: 0.1,
                }),
            );
        }
        let a = scene.ambient();
        assert!((a[0] - 0.2).abs() < 1e-6);
    }
}
