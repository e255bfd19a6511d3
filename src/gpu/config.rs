//! Centralized graphics configuration for consistent wgpu settings

use crate::surface::ShadowMode;

/// Depth buffer bits requested from eframe for the main pass
pub const DEPTH_BUFFER_BITS: u8 = 24;

#[derive(Debug, Clone, Copy)]
pub struct GraphicsConfig {
    pub sample_count: u32,
    pub texture_format: wgpu::TextureFormat,
    /// Must match what eframe allocates for `DEPTH_BUFFER_BITS`
    pub depth_format: wgpu::TextureFormat,
    pub shadow_map_size: u32,
    pub shadow_format: wgpu::TextureFormat,
    pub shadow_mode: ShadowMode,
}

impl GraphicsConfig {
    pub fn new(texture_format: wgpu::TextureFormat) -> Self {
        Self {
            sample_count: 1,
            texture_format,
            depth_format: wgpu::TextureFormat::Depth24Plus,
            shadow_map_size: 2048,
            shadow_format: wgpu::TextureFormat::Depth32Float,
            shadow_mode: ShadowMode::SoftPcf,
        }
    }

    /// Non-sRGB targets need the shader to encode gamma itself
    pub fn needs_manual_gamma(&self) -> bool {
        !self.texture_format.is_srgb()
    }

    pub fn multisample_state(&self) -> wgpu::MultisampleState {
        wgpu::MultisampleState {
            count: self.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        }
    }

    pub fn color_target_state(&self) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format: self.texture_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        }
    }

    pub fn depth_stencil_state(&self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: self.depth_format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_follows_target_format() {
        assert!(GraphicsConfig::new(wgpu::TextureFormat::Bgra8Unorm).needs_manual_gamma());
        assert!(!GraphicsConfig::new(wgpu::TextureFormat::Bgra8UnormSrgb).needs_manual_gamma());
    }
}
