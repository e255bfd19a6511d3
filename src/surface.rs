//! Render surface abstraction
//!
//! The session talks to its drawing target only through this trait; the wgpu
//! implementation lives in `gpu::surface`.

use crate::camera::PerspectiveCamera;
use crate::events::{EventTarget, PointerEvent};
use crate::scene::Scene;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowMode {
    #[default]
    Disabled,
    /// Percentage-closer filtering over a 3x3 kernel
    SoftPcf,
}

pub trait RenderSurface {
    fn size(&self) -> (u32, u32);

    fn set_size(&mut self, width: u32, height: u32);

    fn set_shadow_mode(&mut self, mode: ShadowMode);

    /// Draw one frame of `scene` as seen from `camera`
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera);

    /// Release GPU resources; the surface must not be rendered to afterwards
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;

    /// Event target that receives pointer input for this surface
    fn pointer_events(&self) -> Rc<EventTarget<PointerEvent>>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Counters shared between a `RecordingSurface` and the test that built it
    #[derive(Debug, Default)]
    pub struct SurfaceStats {
        pub renders: Cell<usize>,
        pub renders_after_dispose: Cell<usize>,
        pub dispose_calls: Cell<usize>,
        pub sizes: RefCell<Vec<(u32, u32)>>,
        pub shadow_mode: Cell<ShadowMode>,
        /// Scene node count seen by the most recent render
        pub last_node_count: Cell<usize>,
    }

    #[derive(Debug)]
    pub struct RecordingSurface {
        pub stats: Rc<SurfaceStats>,
        size: (u32, u32),
        disposed: bool,
        events: Rc<EventTarget<PointerEvent>>,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                stats: Rc::new(SurfaceStats::default()),
                size: (width, height),
                disposed: false,
                events: Rc::new(EventTarget::new()),
            }
        }
    }

    impl RenderSurface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.stats.sizes.borrow_mut().push((width, height));
        }

        fn set_shadow_mode(&mut self, mode: ShadowMode) {
            self.stats.shadow_mode.set(mode);
        }

        fn render(&mut self, scene: &Scene, _camera: &PerspectiveCamera) {
            if self.disposed {
                let n = self.stats.renders_after_dispose.get();
                self.stats.renders_after_dispose.set(n + 1);
                return;
            }
            self.stats.renders.set(self.stats.renders.get() + 1);
            self.stats.last_node_count.set(scene.len());
        }

        fn dispose(&mut self) {
            self.disposed = true;
            self.stats.dispose_calls.set(self.stats.dispose_calls.get() + 1);
        }

        fn is_disposed(&self) -> bool {
            self.disposed
        }

        fn pointer_events(&self) -> Rc<EventTarget<PointerEvent>> {
            Rc::clone(&self.events)
        }
    }
}
