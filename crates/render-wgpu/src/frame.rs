use crate::gpu::WgpuRenderer;
use vitrine_render::{PerspectiveCamera, Renderer};
use vitrine_scene::Scene;

/// One surface texture plus the device handles needed to draw into it.
///
/// Built per frame by the host and handed to the frame loop, which only
/// knows the [`Renderer`] trait.
pub struct SurfaceFrame<'a> {
    pub renderer: &'a mut WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
}

impl Renderer for SurfaceFrame<'_> {
    type Output = ();

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.renderer
            .render(self.device, self.queue, self.view, scene, camera);
    }
}
