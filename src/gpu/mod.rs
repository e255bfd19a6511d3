//! GPU rendering through egui-wgpu paint callbacks

pub mod callback;
pub mod config;
pub mod frame;
pub mod renderer;
pub mod surface;

pub use callback::ViewerPaintCallback;
pub use config::{GraphicsConfig, DEPTH_BUFFER_BITS};
pub use frame::{FramePacket, FrameUniforms, ObjectUniforms};
pub use renderer::MeshRenderer;
pub use surface::WgpuSurface;
