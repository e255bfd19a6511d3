//! Viewer session: everything one mounted viewer owns
//!
//! Lifecycle: `mount` builds the surface, camera, lights and ground plane and
//! starts the asset load. `pump` runs once per host frame: it delivers the
//! load result when ready and advances the spin loop. `unmount` cancels the
//! loop and releases everything; it also runs on drop.

use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::constants;
use crate::environment;
use crate::error::{Result, ViewerError};
use crate::events::{ListenerId, ResizeEvent};
use crate::fit::{self, FitParams, FitResult};
use crate::frame_loop::{CancellationToken, FrameLoop, LoopState};
use crate::interaction::{self, DragState, InteractionHandle, SharedDragState};
use crate::loader::{AssetLoader, PendingLoad};
use crate::scene::{
    AmbientLight, DirectionalLight, Helper, Light, NodeId, Object3D, Scene, SceneNode, SharedObject, SpotLight,
};
use crate::surface::{RenderSurface, ShadowMode};
use crate::viewport::Viewport;
use glam::Vec3;
use log::{debug, error, info, warn};
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

pub struct ViewerSession<S: RenderSurface + 'static> {
    config: ViewerConfig,
    scene: Rc<RefCell<Scene>>,
    camera: Rc<RefCell<PerspectiveCamera>>,
    surface: Rc<RefCell<S>>,
    viewport: Rc<Viewport>,
    resize_listener: Option<ListenerId>,
    ground_plane: Option<NodeId>,
    pending: Option<PendingLoad>,
    object: Option<(NodeId, SharedObject)>,
    drag_state: SharedDragState,
    interaction: Option<InteractionHandle>,
    frames: FrameLoop,
    token: CancellationToken,
    load_error: Option<ViewerError>,
    fit: Option<FitResult>,
}

/// Draw `scene` unless the surface has already been disposed
fn render_into<S: RenderSurface>(surface: &RefCell<S>, scene: &RefCell<Scene>, camera: &RefCell<PerspectiveCamera>) {
    let mut surface = surface.borrow_mut();
    if surface.is_disposed() {
        return;
    }
    surface.render(&scene.borrow(), &camera.borrow());
}

/// Spot, ambient and directional lights, plus optional helpers
fn add_light_rig(scene: &mut Scene, debug_helpers: bool) {
    let spot = SpotLight::default();
    let directional = DirectionalLight::default();

    if debug_helpers {
        scene.add(SceneNode::Helper(Helper::spot_light(&spot)));
        scene.add(SceneNode::Helper(Helper::shadow_camera(&spot)));
        scene.add(SceneNode::Helper(Helper::directional_light(&directional)));
    }

    scene.add_light(Light::Spot(spot));
    scene.add_light(Light::Ambient(AmbientLight::default()));
    scene.add_light(Light::Directional(directional));
}

impl<S: RenderSurface + 'static> ViewerSession<S> {
    /// Build the session. Surface creation failure aborts before anything else exists.
    pub fn mount<F>(config: ViewerConfig, viewport: Rc<Viewport>, create_surface: F, loader: &dyn AssetLoader) -> Result<Self>
    where
        F: FnOnce(u32, u32) -> Result<S>,
    {
        let (width, height) = viewport.size();
        let mut surface = create_surface(width, height)?;
        surface.set_shadow_mode(ShadowMode::SoftPcf);

        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(
            constants::camera::FOV_DEGREES,
            viewport.aspect(),
            constants::camera::NEAR,
            constants::camera::FAR,
        );

        add_light_rig(&mut scene, config.debug_helpers);
        let ground_plane = environment::add_ground_plane(&mut scene);

        let scene = Rc::new(RefCell::new(scene));
        let camera = Rc::new(RefCell::new(camera));
        let surface = Rc::new(RefCell::new(surface));

        // Re-render on resize so a stopped loop never leaves a stale aspect on screen
        let resize_listener = {
            let scene = Rc::clone(&scene);
            let camera = Rc::clone(&camera);
            let surface = Rc::clone(&surface);
            viewport.resize_events().add_listener((), move |event: &ResizeEvent| {
                camera.borrow_mut().set_viewport(event.width, event.height);
                {
                    let mut surface = surface.borrow_mut();
                    if surface.is_disposed() {
                        return;
                    }
                    surface.set_size(event.width, event.height);
                }
                render_into(&surface, &scene, &camera);
            })
        };

        let pending = loader.load(&config.asset_path);
        info!("Viewer mounted at {}x{}", width, height);

        let token = CancellationToken::new();
        Ok(Self {
            config,
            scene,
            camera,
            surface,
            viewport,
            resize_listener: Some(resize_listener),
            ground_plane: Some(ground_plane),
            pending: Some(pending),
            object: None,
            drag_state: Rc::new(Cell::new(DragState::Idle)),
            interaction: None,
            frames: FrameLoop::new(token.clone()),
            token,
            load_error: None,
            fit: None,
        })
    }

    /// One host frame. Returns true while the session still wants frames.
    pub fn pump(&mut self) -> bool {
        if let Some(result) = self.pending.as_ref().and_then(PendingLoad::poll) {
            self.pending = None;
            self.on_asset_loaded(result);
        }
        self.tick();
        self.wants_frames()
    }

    /// True while a load is pending or the spin loop is running
    pub fn wants_frames(&self) -> bool {
        !self.token.is_cancelled() && (self.pending.is_some() || self.frames.is_running())
    }

    /// Continuation of the asset load; a no-op after unmount or once an earlier
    /// result, success or failure, has been handled
    pub fn on_asset_loaded(&mut self, result: Result<Object3D>) {
        if self.token.is_cancelled() {
            debug!("Asset load completed after unmount, ignoring");
            return;
        }
        if self.object.is_some() || self.load_error.is_some() {
            warn!("Asset load already settled, ignoring another result");
            return;
        }

        let mut object = match result {
            Ok(object) => object,
            Err(e) => {
                error!("Failed to load {}: {}", self.config.asset_path.display(), e);
                self.load_error = Some(e);
                self.render_frame();
                return;
            }
        };

        object.traverse_mut(&mut |node| {
            if let Some(mesh) = node.mesh.as_mut() {
                mesh.cast_shadow = true;
            }
        });
        let (id, shared) = self.scene.borrow_mut().add_object(object);

        {
            let mut object = shared.borrow_mut();
            let mut camera = self.camera.borrow_mut();
            let params = FitParams {
                target_size: constants::fit::TARGET_SIZE,
                padding: constants::fit::CAMERA_PADDING,
                orientation: Vec3::from_array(constants::fit::ORIENTATION),
            };
            self.fit = fit::fit_object(&mut object, &mut camera, &params);
            match &self.fit {
                Some(fit) => info!(
                    "Fitted '{}': scale {:.4}, camera at {:.2}, far {:.2}",
                    object.name, fit.scale, fit.camera_distance, fit.camera_far
                ),
                None => warn!("'{}' has no geometry to fit", object.name),
            }
            object.position += Vec3::from_array(self.config.fit_offset);
        }

        self.render_frame();
        self.frames.start();

        let handle = interaction::attach(
            &*self.surface.borrow(),
            &shared,
            Rc::clone(&self.drag_state),
            self.config.drag_sensitivity,
        );
        self.interaction = Some(handle);
        self.object = Some((id, shared));
    }

    /// One frame of the spin loop. Returns false without touching anything
    /// when the loop is not running.
    pub fn tick(&mut self) -> bool {
        if !self.frames.begin_tick() {
            return false;
        }
        let Some((_, object)) = &self.object else {
            return false;
        };
        object.borrow_mut().rotation.z += self.config.spin_per_frame;
        self.render_frame();
        true
    }

    fn render_frame(&self) {
        render_into(&self.surface, &self.scene, &self.camera);
    }

    /// Release everything the mount created. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();

        if let Some(mut handle) = self.interaction.take() {
            handle.teardown();
        }
        if let Some(id) = self.resize_listener.take() {
            self.viewport.resize_events().remove_listener(id);
        }
        if let Some(id) = self.ground_plane.take() {
            environment::remove_ground_plane(&mut self.scene.borrow_mut(), id);
        }
        self.pending = None;
        self.surface.borrow_mut().dispose();
        info!("Viewer unmounted after {} frames", self.frames.ticks());
    }

    /// False once `unmount` has run
    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Configuration the session was mounted with
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Borrow the scene; do not hold the guard across `pump` or `tick`
    pub fn scene(&self) -> Ref<'_, Scene> {
        self.scene.borrow()
    }

    /// Borrow the camera
    pub fn camera(&self) -> Ref<'_, PerspectiveCamera> {
        self.camera.borrow()
    }

    /// Render surface shared with the resize listener
    pub fn surface(&self) -> &Rc<RefCell<S>> {
        &self.surface
    }

    /// The loaded object, once the asset has arrived
    pub fn object(&self) -> Option<&SharedObject> {
        self.object.as_ref().map(|(_, object)| object)
    }

    /// Error from a failed asset load
    pub fn load_error(&self) -> Option<&ViewerError> {
        self.load_error.as_ref()
    }

    /// Scale and camera placement computed for the loaded object
    pub fn fit(&self) -> Option<&FitResult> {
        self.fit.as_ref()
    }

    /// Current state of the spin loop
    pub fn loop_state(&self) -> LoopState {
        self.frames.state()
    }

    /// Current drag state of the interaction controller
    pub fn drag_state(&self) -> DragState {
        self.drag_state.get()
    }
}

impl<S: RenderSurface + 'static> Drop for ViewerSession<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
