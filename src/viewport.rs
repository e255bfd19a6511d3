//! The window-level viewport: current size plus resize notifications

use crate::events::{EventTarget, ResizeEvent};
use log::debug;
use std::cell::Cell;

#[derive(Debug)]
pub struct Viewport {
    size: Cell<(u32, u32)>,
    resize_events: EventTarget<ResizeEvent>,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new((width, height)),
            resize_events: EventTarget::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size.get()
    }

    pub fn aspect(&self) -> f32 {
        let (w, h) = self.size();
        if h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }

    pub fn resize_events(&self) -> &EventTarget<ResizeEvent> {
        &self.resize_events
    }

    /// Record a new size and notify listeners; unchanged sizes are ignored
    pub fn resize(&self, width: u32, height: u32) {
        if self.size.get() == (width, height) {
            return;
        }
        debug!("Viewport resized to {}x{}", width, height);
        self.size.set((width, height));
        self.resize_events.dispatch(&ResizeEvent { width, height });
    }
}
