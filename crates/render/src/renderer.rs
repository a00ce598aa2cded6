use crate::camera::PerspectiveCamera;
use std::fmt::Write;
use vitrine_scene::{Background, ObjectKind, Scene};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and the camera, then produces output. It
/// never mutates the scene; GPU backends keep their own resource caches.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` as seen through `camera`.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Text renderer for headless use.
///
/// Produces a human-readable listing of the scene and camera. Used by the
/// CLI and by tests that drive the frame loop without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let background = match scene.background() {
            Background::Color(c) => format!("color({:.2}, {:.2}, {:.2})", c.r, c.g, c.b),
            Background::Environment => "environment".to_string(),
        };
        let _ = writeln!(
            out,
            "=== Scene (frame={}, objects={}, background={}) ===",
            self.frames,
            scene.object_count(),
            background
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees,
            camera.aspect
        );

        for object in scene.objects() {
            let p = object.transform.position;
            let _ = write!(
                out,
                "  [{}] {} ({}) pos=({:.2}, {:.2}, {:.2})",
                object.id.0,
                object.name,
                object.kind.label(),
                p.x,
                p.y,
                p.z
            );
            match &object.kind {
                ObjectKind::Card(card) => {
                    let _ = write!(out, " yaw={:.4}", card.yaw);
                }
                ObjectKind::Reflector(r) => {
                    let _ = write!(out, " target={}x{}", r.texture_size.0, r.texture_size.1);
                }
                ObjectKind::DirectionalLight(l) => {
                    let _ = write!(out, " intensity={}", l.intensity);
                }
                ObjectKind::AmbientLight(l) => {
                    let _ = write!(out, " intensity={}", l.intensity);
                }
                _ => {}
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vitrine_assets::Texture;
    use vitrine_common::{Color, Viewport};

    fn camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 1.0, 10000.0);
        cam.position = Vec3::new(250.0, 50.0, 250.0);
        cam.look_at(Vec3::new(0.0, 50.0, 0.0));
        cam
    }

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new(Color::WHITE);
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&scene, &camera());

        assert!(output.contains("frame=1"));
        assert!(output.contains("objects=0"));
        assert!(output.contains("background=color(1.00, 1.00, 1.00)"));
    }

    #[test]
    fn debug_renderer_lists_assembled_scene() {
        let assembled = vitrine_scene::assemble(
            Viewport::new(640.0, 480.0, 1.0),
            Texture::solid("front", [255; 4]),
            Texture::solid("back", [255; 4]),
        );
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&assembled.scene, &camera());

        assert!(output.contains("objects=8"));
        assert!(output.contains("card (card)"));
        assert!(output.contains("target=640x480"));
        assert!(output.contains("eye=(250.0, 50.0, 250.0)"));
    }

    #[test]
    fn counts_frames() {
        let scene = Scene::new(Color::WHITE);
        let mut renderer = DebugTextRenderer::new();
        renderer.render(&scene, &camera());
        renderer.render(&scene, &camera());
        assert_eq!(renderer.frames(), 2);
    }
}
