//! egui paint callback that hands a frame packet to the shared `MeshRenderer`

use super::frame::FramePacket;
use super::renderer::MeshRenderer;
use egui_wgpu::CallbackTrait;
use log::warn;
use std::sync::Arc;

/// One frame's worth of scene data, painted inside egui's render pass
#[derive(Clone)]
pub struct ViewerPaintCallback {
    packet: Arc<FramePacket>,
}

impl ViewerPaintCallback {
    pub fn new(packet: Arc<FramePacket>) -> Self {
        Self { packet }
    }

    pub fn paint_callback(self, rect: egui::Rect) -> egui::PaintCallback {
        egui_wgpu::Callback::new_paint_callback(rect, self)
    }
}

impl CallbackTrait for ViewerPaintCallback {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        _screen_descriptor: &egui_wgpu::ScreenDescriptor,
        egui_encoder: &mut wgpu::CommandEncoder,
        callback_resources: &mut egui_wgpu::CallbackResources,
    ) -> Vec<wgpu::CommandBuffer> {
        match callback_resources.get_mut::<MeshRenderer>() {
            Some(renderer) => renderer.prepare(device, queue, egui_encoder, &self.packet),
            None => warn!("Paint callback prepared without a mesh renderer"),
        }
        Vec::new()
    }

    fn paint(
        &self,
        _info: egui::PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'static>,
        callback_resources: &egui_wgpu::CallbackResources,
    ) {
        if let Some(renderer) = callback_resources.get::<MeshRenderer>() {
            renderer.paint(render_pass, &self.packet);
        }
    }
}
