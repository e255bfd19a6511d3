//! `RenderSurface` backed by egui's wgpu render state

use super::callback::ViewerPaintCallback;
use super::config::GraphicsConfig;
use super::frame::FramePacket;
use super::renderer::MeshRenderer;
use crate::camera::PerspectiveCamera;
use crate::error::{Result, ViewerError};
use crate::events::{EventTarget, PointerEvent};
use crate::scene::Scene;
use crate::surface::{RenderSurface, ShadowMode};
use log::{debug, info};
use std::rc::Rc;
use std::sync::Arc;

pub struct WgpuSurface {
    render_state: egui_wgpu::RenderState,
    config: GraphicsConfig,
    size: (u32, u32),
    disposed: bool,
    latest: Option<Arc<FramePacket>>,
    pointer_events: Rc<EventTarget<PointerEvent>>,
}

impl WgpuSurface {
    /// Install a `MeshRenderer` into egui's callback resources.
    ///
    /// Fails when eframe was started without a wgpu render state.
    pub fn create(render_state: Option<&egui_wgpu::RenderState>, width: u32, height: u32) -> Result<Self> {
        let render_state = render_state
            .ok_or_else(|| ViewerError::SurfaceUnavailable("eframe has no wgpu render state".into()))?
            .clone();

        let config = GraphicsConfig::new(render_state.target_format);
        let renderer = MeshRenderer::new(&render_state.device, config);
        render_state
            .renderer
            .write()
            .callback_resources
            .insert(renderer);
        info!("Render surface created at {}x{}", width, height);

        Ok(Self {
            render_state,
            config,
            size: (width, height),
            disposed: false,
            latest: None,
            pointer_events: Rc::new(EventTarget::new()),
        })
    }

    /// Paint callback for the most recently rendered frame, if any
    pub fn paint_callback(&self, rect: egui::Rect) -> Option<egui::PaintCallback> {
        if self.disposed {
            return None;
        }
        let packet = Arc::clone(self.latest.as_ref()?);
        Some(ViewerPaintCallback::new(packet).paint_callback(rect))
    }
}

impl RenderSurface for WgpuSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_shadow_mode(&mut self, mode: ShadowMode) {
        debug!("Shadow mode set to {:?}", mode);
        self.config.shadow_mode = mode;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        if self.disposed {
            return;
        }
        let packet = FramePacket::build(
            scene,
            camera,
            self.config.shadow_mode,
            self.config.shadow_map_size,
            self.config.needs_manual_gamma(),
        );
        self.latest = Some(Arc::new(packet));
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.latest = None;
        self.render_state
            .renderer
            .write()
            .callback_resources
            .remove::<MeshRenderer>();
        info!("Render surface disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn pointer_events(&self) -> Rc<EventTarget<PointerEvent>> {
        Rc::clone(&self.pointer_events)
    }
}
