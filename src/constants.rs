//! Viewer-wide constants and default values
//!
//! Centralized location for the fixed numbers that shape the scene

/// Camera defaults
pub mod camera {
    /// Vertical field of view in degrees
    pub const FOV_DEGREES: f32 = 75.0;
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 1000.0;
}

/// Bounding-box fit applied to the loaded object
pub mod fit {
    /// Largest dimension of the object after normalization, in world units
    pub const TARGET_SIZE: f32 = 50.0;

    /// Multiplier applied to the camera distance and the far plane
    pub const CAMERA_PADDING: f32 = 3.0;

    /// Canonical orientation (XYZ Euler, radians)
    pub const ORIENTATION: [f32; 3] = [
        std::f32::consts::FRAC_PI_2,
        std::f32::consts::PI,
        std::f32::consts::PI,
    ];
}

/// Animation and interaction rates
pub mod motion {
    /// Radians added to the Z rotation every frame tick
    pub const SPIN_PER_FRAME: f32 = 0.005;

    /// Radians of Z rotation per pixel of horizontal drag
    pub const DRAG_RADIANS_PER_PIXEL: f32 = 0.01;
}

/// Ground plane built by the environment setup
pub mod ground {
    pub const NAME: &str = "ground_plane";
    pub const SIZE: f32 = 500.0;
    pub const HEIGHT: f32 = -25.0;
    pub const COLOR: [f32; 3] = [0.0, 0.0, 0.0];
}

/// Light rig
pub mod lights {
    pub const SPOT_POSITION: [f32; 3] = [5.0, 30.0, 5.0];
    pub const SPOT_INTENSITY: f32 = 10_000.0;
    pub const SPOT_ANGLE: f32 = std::f32::consts::PI / 3.5;
    pub const SPOT_PENUMBRA: f32 = 0.5;
    pub const SPOT_DECAY: f32 = 2.0;
    pub const SPOT_DISTANCE: f32 = 200.0;

    pub const AMBIENT_INTENSITY: f32 = 0.3;

    pub const DIRECTIONAL_INTENSITY: f32 = 0.2;
    /// Direction the directional light shines from (normalized at use)
    pub const DIRECTIONAL_FROM: [f32; 3] = [5.0, 5.0, 5.0];
}

/// Window defaults
pub mod window {
    pub const TITLE: &str = "Sting";
    pub const DEFAULT_SIZE: [f32; 2] = [1280.0, 800.0];
}

/// Default asset location, relative to the working directory
pub const DEFAULT_ASSET_PATH: &str = "assets/Sting-Sword-lowpoly.obj";
