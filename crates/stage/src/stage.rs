use crate::config::StageConfig;
use crate::gate::{FramePhase, LoadGate};
use crate::overlay::LoadingOverlay;
use glam::Vec3;
use std::sync::Arc;
use vitrine_assets::{AssetError, EnvironmentMap, LoadEvent, LoadProgress, Texture};
use vitrine_common::{ObjectId, Viewport};
use vitrine_input::OrbitAction;
use vitrine_render::{OrbitControls, PerspectiveCamera, Renderer};
use vitrine_scene::Scene;

pub const CAMERA_FOV: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 1.0;
pub const CAMERA_FAR: f32 = 10_000.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(250.0, 50.0, 250.0);
pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 50.0, 0.0);
pub const ORBIT_DAMPING: f32 = 0.05;
/// Card yaw added per active frame, in radians.
pub const CARD_YAW_STEP: f32 = 0.005;

/// Owns the scene, camera and controls, and drives them frame by frame.
pub struct Stage {
    scene: Scene,
    card: ObjectId,
    reflector: ObjectId,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    viewport: Viewport,
    gate: LoadGate,
    overlay: LoadingOverlay,
    frames_rendered: u64,
}

impl Stage {
    /// Build the scene and camera for `viewport`. The gate starts closed.
    pub fn assemble(viewport: Viewport, front: Texture, back: Texture, fade_seconds: f32) -> Self {
        let assembled = vitrine_scene::assemble(viewport, front, back);

        let mut camera = PerspectiveCamera::new(CAMERA_FOV, viewport.aspect(), CAMERA_NEAR, CAMERA_FAR);
        camera.position = CAMERA_POSITION;
        camera.look_at(CAMERA_TARGET);

        tracing::info!(
            objects = assembled.scene.object_count(),
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio,
            "stage assembled"
        );

        Self {
            scene: assembled.scene,
            card: assembled.card,
            reflector: assembled.reflector,
            camera,
            controls: OrbitControls::new(CAMERA_TARGET).with_damping(ORBIT_DAMPING),
            viewport,
            gate: LoadGate::new(),
            overlay: LoadingOverlay::new(fade_seconds),
            frames_rendered: 0,
        }
    }

    /// Assemble with card textures read from the configured asset directory.
    /// A missing or broken card image falls back to a blank face.
    pub fn from_config(config: &StageConfig, viewport: Viewport) -> Self {
        let front = vitrine_assets::load_texture_or_blank(config.card_front_path());
        let back = vitrine_assets::load_texture_or_blank(config.card_back_path());
        Self::assemble(viewport, front, back, config.fade_seconds)
    }

    pub fn phase(&self) -> FramePhase {
        self.gate.phase()
    }

    pub fn is_loaded(&self) -> bool {
        self.gate.is_open()
    }

    /// Route one event from the environment loader.
    pub fn handle_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress(progress) => {
                self.on_progress(progress);
            }
            LoadEvent::Loaded(environment) => self.on_environment_loaded(environment),
            LoadEvent::Failed(error) => self.on_environment_failed(&error),
        }
    }

    /// Update the overlay with a progress report. Returns the percentage.
    pub fn on_progress(&mut self, progress: LoadProgress) -> f32 {
        let percent = progress.percent();
        tracing::info!("{percent}% loaded");
        self.overlay.set_progress(percent);
        percent
    }

    /// Install the environment, open the gate and start the overlay fade.
    pub fn on_environment_loaded(&mut self, environment: EnvironmentMap) {
        if !self.gate.open() {
            tracing::warn!("environment already loaded, ignoring second map");
            return;
        }
        tracing::info!(
            width = environment.width,
            height = environment.height,
            "environment ready"
        );
        self.scene.set_environment(Arc::new(environment));
        self.overlay.set_progress(100.0);
        self.overlay.hide();
    }

    /// The gate stays closed; the overlay keeps showing the failure.
    pub fn on_environment_failed(&mut self, error: &AssetError) {
        tracing::error!(%error, "environment load failed");
        self.overlay.fail(error.to_string());
    }

    /// Run one frame. Returns `None` while the environment is loading.
    pub fn frame<R: Renderer>(&mut self, renderer: &mut R) -> Option<R::Output> {
        if self.phase() == FramePhase::Waiting {
            return None;
        }
        self.scene.rotate_card(self.card, CARD_YAW_STEP);
        self.controls.update(&mut self.camera);
        self.frames_rendered += 1;
        Some(renderer.render(&self.scene, &self.camera))
    }

    /// Follow a viewport change: camera aspect, projection, mirror target.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
        self.camera.update_projection_matrix();
        let size = viewport.physical_size();
        self.scene.set_reflector_texture_size(self.reflector, size);
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            physical_width = size.0,
            physical_height = size.1,
            "stage resized"
        );
    }

    /// Forward pointer input to the orbit controls.
    pub fn orbit(&mut self, action: OrbitAction) {
        if action.is_noop() {
            return;
        }
        self.controls.apply(action, &self.camera, self.viewport.height);
    }

    pub fn advance_overlay(&mut self, dt: f32) {
        self.overlay.advance(dt);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn overlay(&self) -> &LoadingOverlay {
        &self.overlay
    }

    pub fn card_yaw(&self) -> f32 {
        self.scene.card(self.card).map_or(0.0, |card| card.yaw)
    }

    pub fn reflector_texture_size(&self) -> Option<(u32, u32)> {
        self.scene.get(self.reflector).and_then(|object| match &object.kind {
            vitrine_scene::ObjectKind::Reflector(r) => Some(r.texture_size),
            _ => None,
        })
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::path::PathBuf;
    use vitrine_assets::Mapping;
    use vitrine_render::DebugTextRenderer;
    use vitrine_scene::Background;
    use vitrine_scene::assembly::OBJECT_COUNT;

    fn stage() -> Stage {
        Stage::assemble(
            Viewport::new(800.0, 600.0, 1.0),
            Texture::solid("front", [255; 4]),
            Texture::solid("back", [0, 0, 0, 255]),
            0.5,
        )
    }

    fn environment() -> EnvironmentMap {
        EnvironmentMap {
            width: 2,
            height: 1,
            texels: vec![0.5; 8],
            mapping: Mapping::EquirectangularReflection,
        }
    }

    #[test]
    fn starts_waiting_with_full_scene() {
        let stage = stage();
        assert!(!stage.is_loaded());
        assert_eq!(stage.phase(), FramePhase::Waiting);
        assert_eq!(stage.scene().object_count(), OBJECT_COUNT);
        assert_eq!(stage.camera().position, CAMERA_POSITION);
        assert_eq!(stage.camera().target, CAMERA_TARGET);
        assert!((stage.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn waiting_frames_do_nothing() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        let yaw = stage.card_yaw();
        for _ in 0..10 {
            assert!(stage.frame(&mut renderer).is_none());
        }
        assert_eq!(renderer.frames(), 0);
        assert_eq!(stage.frames_rendered(), 0);
        assert_eq!(stage.card_yaw(), yaw);
    }

    #[test]
    fn active_frames_rotate_the_card() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        stage.on_environment_loaded(environment());
        let yaw = stage.card_yaw();

        for _ in 0..4 {
            let output = stage.frame(&mut renderer).unwrap();
            assert!(output.contains("background=environment"));
        }
        assert!((stage.card_yaw() - (yaw + 4.0 * CARD_YAW_STEP)).abs() < 1e-5);
        assert_eq!(renderer.frames(), 4);
        assert_eq!(stage.frames_rendered(), 4);
    }

    #[test]
    fn gate_opens_once() {
        let mut stage = stage();
        stage.on_environment_loaded(environment());
        assert!(stage.is_loaded());
        let first = Arc::clone(stage.scene().environment().unwrap());

        stage.on_environment_loaded(EnvironmentMap {
            width: 4,
            ..environment()
        });
        assert!(stage.is_loaded());
        assert!(Arc::ptr_eq(&first, stage.scene().environment().unwrap()));
    }

    #[test]
    fn load_completion_fades_overlay() {
        let mut stage = stage();
        assert_eq!(stage.overlay().target_opacity(), 1.0);
        stage.handle_event(LoadEvent::Loaded(environment()));
        assert_eq!(stage.overlay().target_opacity(), 0.0);
        assert_eq!(stage.scene().background(), Background::Environment);
        stage.advance_overlay(1.0);
        assert!(!stage.overlay().is_visible());
    }

    #[test]
    fn progress_updates_overlay() {
        let mut stage = stage();
        assert_eq!(stage.on_progress(LoadProgress::new(50, 200)), 25.0);
        assert_eq!(stage.overlay().progress(), 25.0);
        stage.handle_event(LoadEvent::Progress(LoadProgress::new(200, 200)));
        assert_eq!(stage.overlay().progress(), 100.0);
        assert!(!stage.is_loaded());
    }

    #[test]
    fn unknown_total_reports_zero() {
        let mut stage = stage();
        let progress = LoadProgress {
            loaded: 4096,
            total: None,
        };
        assert_eq!(stage.on_progress(progress), 0.0);
    }

    #[test]
    fn failure_keeps_gate_closed() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        stage.handle_event(LoadEvent::Failed(AssetError::UnsupportedFormat(
            PathBuf::from("sky.tga"),
        )));
        assert!(!stage.is_loaded());
        assert!(stage.overlay().error().unwrap().contains("sky.tga"));
        assert!(stage.frame(&mut renderer).is_none());
    }

    #[test]
    fn resize_follows_viewport() {
        let mut stage = stage();
        for (w, h, ratio) in [
            (1024.0, 768.0, 1.0),
            (1920.0, 1080.0, 2.0),
            (375.0, 812.0, 3.0),
            (333.0, 200.0, 1.5),
        ] {
            let viewport = Viewport::new(w, h, ratio);
            stage.resize(viewport);
            assert!((stage.camera().aspect - w / h).abs() < 1e-6);
            assert_eq!(stage.viewport(), viewport);
            assert_eq!(stage.reflector_texture_size(), Some(viewport.physical_size()));
        }
    }

    #[test]
    fn reflector_matches_surface_at_fractional_scale() {
        let mut stage = stage();
        for (w, h) in [(901, 600), (908, 515), (1366, 767)] {
            stage.resize(Viewport::from_physical(w, h, 1.75));
            assert_eq!(stage.reflector_texture_size(), Some((w, h)));
        }
    }

    #[test]
    fn progress_keeps_fractional_percent() {
        let mut stage = stage();
        let percent = stage.on_progress(LoadProgress::new(51, 200));
        assert_eq!(percent, 25.5);
        assert_eq!(stage.overlay().progress(), 25.5);
    }

    #[test]
    fn zero_height_does_not_break_aspect() {
        let mut stage = stage();
        stage.resize(Viewport::new(640.0, 0.0, 1.0));
        assert!(stage.camera().aspect.is_finite());
        assert!(stage.camera().projection_matrix().is_finite());
    }

    #[test]
    fn object_set_is_stable_across_frames() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        stage.on_environment_loaded(environment());
        for _ in 0..50 {
            stage.frame(&mut renderer);
            assert_eq!(stage.scene().object_count(), OBJECT_COUNT);
        }
    }

    #[test]
    fn orbit_input_moves_camera_over_frames() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        stage.on_environment_loaded(environment());
        let start = stage.camera().position;
        stage.orbit(OrbitAction::Rotate(Vec2::new(100.0, 0.0)));
        stage.frame(&mut renderer);
        assert_ne!(stage.camera().position, start);
        assert!(stage.controls().is_settling());
    }

    #[test]
    fn orbit_input_waits_for_load() {
        let mut stage = stage();
        let mut renderer = DebugTextRenderer::new();
        let start = stage.camera().position;
        stage.orbit(OrbitAction::Rotate(Vec2::new(100.0, 0.0)));
        stage.frame(&mut renderer);
        assert_eq!(stage.camera().position, start);
    }

    #[test]
    fn from_config_falls_back_to_blank_cards() {
        let dir = tempfile::tempdir().unwrap();
        let config = StageConfig::default().with_asset_dir(dir.path());
        let stage = Stage::from_config(&config, Viewport::default());
        assert_eq!(stage.scene().textures().len(), 2);
        assert!(stage.scene().textures().iter().all(|t| t.width == 1 && t.height == 1));
    }

    #[test]
    fn from_config_reads_card_images() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(4, 6, image::Rgba([9, 8, 7, 255]))
            .save(dir.path().join("card_top.png"))
            .unwrap();
        let config = StageConfig::default().with_asset_dir(dir.path());
        let stage = Stage::from_config(&config, Viewport::default());
        let front = &stage.scene().textures()[0];
        assert_eq!((front.width, front.height), (4, 6));
    }
}
