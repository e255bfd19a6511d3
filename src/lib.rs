//! Sting viewer library
//!
//! A single-object 3D viewer: loads an OBJ mesh, fits it to a fixed size,
//! lights it with a shadow-casting spot light and spins it. Dragging with
//! the primary pointer rotates it by hand.

pub mod app;
pub mod camera;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod events;
pub mod fit;
pub mod frame_loop;
pub mod gpu;
pub mod interaction;
pub mod loader;
pub mod scene;
pub mod session;
pub mod surface;
pub mod viewport;

// Re-export commonly used types
pub use app::ViewerApp;
pub use camera::PerspectiveCamera;
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use loader::{AssetLoader, ObjLoader};
pub use scene::{Object3D, Scene};
pub use session::ViewerSession;
pub use surface::{RenderSurface, ShadowMode};
