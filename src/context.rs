//! Application state shared by the render loop and the resize responder.

use crate::assets::{AssetLoader, TextureData};
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::config::SceneConfig;
use crate::scene::{MaterialPolicy, Scene};
use crate::uniforms::ShaderParameters;
use crate::viewport::{clamp_pixel_ratio, Viewport};

/// Everything the frame loop, the responder and the renderer operate on.
///
/// Passed by reference; there is no global state.
#[derive(Debug)]
pub struct AppContext {
    pub config: SceneConfig,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub params: ShaderParameters,
    pub viewport: Viewport,
    pub policy: MaterialPolicy,
}

impl AppContext {
    /// Build the context for a window of the given logical size.
    ///
    /// The scene starts empty and the firefly uniforms are not installed.
    pub fn new(config: SceneConfig, width: u32, height: u32, device_ratio: f64) -> Self {
        let ratio = clamp_pixel_ratio(device_ratio, config.renderer.max_pixel_ratio);
        let viewport = Viewport::new(width.max(1), height.max(1), ratio);
        let camera = PerspectiveCamera::new(&config.camera, viewport.aspect());
        let controls = OrbitControls::new(&config.controls);

        Self {
            config,
            scene: Scene::new(),
            camera,
            controls,
            params: ShaderParameters::new(),
            viewport,
            policy: MaterialPolicy::default(),
        }
    }

    /// Generate both firefly clouds and install their uniforms.
    pub fn spawn_fireflies(&mut self) {
        self.scene.spawn_fireflies(&self.config.fireflies);
        self.params.install_fireflies(
            self.viewport.pixel_ratio,
            self.config.fireflies.size,
            self.viewport.resolution(),
        );
        log::info!(
            "spawned {} fireflies in {} clouds",
            self.scene.firefly_count(),
            self.scene.fireflies.len()
        );
    }

    /// Load the model and baked texture through `loader`.
    ///
    /// Failures are logged and degrade the scene: a missing model leaves no
    /// meshes, a missing texture is replaced by a neutral 1x1 texture.
    pub async fn load_assets<L: AssetLoader>(&mut self, loader: &L) {
        let model_path = self.config.assets.model.clone();
        let texture_path = self.config.assets.baked_texture.clone();

        let texture = match loader.load_texture(&texture_path).await {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("baked texture unavailable, using fallback: {}", e);
                TextureData::fallback()
            }
        };
        self.scene.baked_texture = Some(texture);

        match loader.load_model(&model_path).await {
            Ok(model) => {
                let added = self.scene.add_model(model, &self.policy);
                log::info!("loaded {} meshes from {}", added, model_path.display());
            }
            Err(e) => log::warn!("model unavailable, scene has no meshes: {}", e),
        }
    }
}
