//! Drag-to-spin interaction
//!
//! Horizontal pointer movement while the primary button is held rotates the
//! target object around its Z axis. Vertical movement is tracked but not applied.

use crate::events::{EventTarget, ListenerId, PointerEvent, PointerEventKind};
use crate::scene::SharedObject;
use crate::surface::RenderSurface;
use log::debug;
use std::cell::Cell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { last_x: f32, last_y: f32 },
}

pub type SharedDragState = Rc<Cell<DragState>>;

/// Pointer displacement since the last recorded position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragDelta {
    pub dx: f32,
    pub dy: f32,
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    /// Advance the state machine; returns the delta for moves made while dragging
    pub fn apply(&mut self, event: &PointerEvent) -> Option<DragDelta> {
        match (event.kind, *self) {
            (PointerEventKind::Down, _) => {
                *self = DragState::Dragging { last_x: event.x, last_y: event.y };
                None
            }
            (PointerEventKind::Move, DragState::Dragging { last_x, last_y }) => {
                *self = DragState::Dragging { last_x: event.x, last_y: event.y };
                Some(DragDelta {
                    dx: event.x - last_x,
                    dy: event.y - last_y,
                })
            }
            (PointerEventKind::Move, DragState::Idle) => None,
            (PointerEventKind::Up | PointerEventKind::Leave, _) => {
                *self = DragState::Idle;
                None
            }
        }
    }
}

/// Owns the four pointer listeners; removing them is idempotent and also happens on drop
#[derive(Debug)]
pub struct InteractionHandle {
    events: Weak<EventTarget<PointerEvent>>,
    listeners: Vec<ListenerId>,
}

impl InteractionHandle {
    pub fn teardown(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        if let Some(events) = self.events.upgrade() {
            for id in self.listeners.drain(..) {
                events.remove_listener(id);
            }
            debug!("Interaction listeners detached");
        } else {
            self.listeners.clear();
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }
}

impl Drop for InteractionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Wire drag rotation of `target` to the surface's pointer events
pub fn attach<S: RenderSurface + ?Sized>(
    surface: &S,
    target: &SharedObject,
    drag_state: SharedDragState,
    radians_per_pixel: f32,
) -> InteractionHandle {
    let events = surface.pointer_events();
    let target: Weak<_> = Rc::downgrade(target);

    let mut listeners = Vec::with_capacity(4);
    for kind in [
        PointerEventKind::Down,
        PointerEventKind::Move,
        PointerEventKind::Up,
        PointerEventKind::Leave,
    ] {
        let drag_state = Rc::clone(&drag_state);
        let target = target.clone();
        let id = events.add_listener(kind, move |event: &PointerEvent| {
            let mut state = drag_state.get();
            let delta = state.apply(event);
            drag_state.set(state);

            let Some(delta) = delta else { return };
            // Object may already be gone during teardown
            if let Some(object) = target.upgrade() {
                object.borrow_mut().rotation.z += delta.dx * radians_per_pixel;
            }
        });
        listeners.push(id);
    }

    InteractionHandle {
        events: Rc::downgrade(&events),
        listeners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Object3D;
    use crate::surface::testing::RecordingSurface;
    use std::cell::RefCell;

    const K: f32 = 0.01;

    fn setup() -> (RecordingSurface, SharedObject, SharedDragState) {
        let surface = RecordingSurface::new(800, 600);
        let object = Rc::new(RefCell::new(Object3D::group("sword")));
        (surface, object, Rc::new(Cell::new(DragState::Idle)))
    }

    fn rotation(object: &SharedObject) -> f32 {
        object.borrow().rotation.z
    }

    #[test]
    fn test_rotation_is_k_times_sum_of_horizontal_deltas() {
        let (surface, object, drag) = setup();
        let _handle = attach(&surface, &object, drag, K);
        let events = surface.pointer_events();

        events.dispatch(&PointerEvent::down(100.0, 100.0));
        events.dispatch(&PointerEvent::moved(110.0, 50.0));
        events.dispatch(&PointerEvent::moved(105.0, 400.0));
        events.dispatch(&PointerEvent::moved(145.0, 0.0));
        events.dispatch(&PointerEvent::up(145.0, 0.0));

        assert!((rotation(&object) - K * 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_movement_never_rotates() {
        let (surface, object, drag) = setup();
        let _handle = attach(&surface, &object, drag, K);
        let events = surface.pointer_events();

        events.dispatch(&PointerEvent::down(10.0, 10.0));
        events.dispatch(&PointerEvent::moved(10.0, 300.0));
        events.dispatch(&PointerEvent::moved(10.0, -300.0));
        events.dispatch(&PointerEvent::up(10.0, -300.0));

        assert_eq!(rotation(&object), 0.0);
    }

    #[test]
    fn test_moves_after_up_or_leave_are_ignored() {
        let (surface, object, drag) = setup();
        let _handle = attach(&surface, &object, Rc::clone(&drag), K);
        let events = surface.pointer_events();

        events.dispatch(&PointerEvent::down(0.0, 0.0));
        events.dispatch(&PointerEvent::moved(20.0, 0.0));
        events.dispatch(&PointerEvent::up(20.0, 0.0));
        let after_up = rotation(&object);
        events.dispatch(&PointerEvent::moved(200.0, 0.0));
        assert_eq!(rotation(&object), after_up);
        assert_eq!(drag.get(), DragState::Idle);

        events.dispatch(&PointerEvent::down(200.0, 0.0));
        events.dispatch(&PointerEvent::leave(200.0, 0.0));
        events.dispatch(&PointerEvent::moved(500.0, 0.0));
        assert_eq!(rotation(&object), after_up);
    }

    #[test]
    fn test_new_drag_starts_from_down_position() {
        let (surface, object, drag) = setup();
        let _handle = attach(&surface, &object, drag, K);
        let events = surface.pointer_events();

        events.dispatch(&PointerEvent::down(0.0, 0.0));
        events.dispatch(&PointerEvent::up(0.0, 0.0));
        events.dispatch(&PointerEvent::down(300.0, 0.0));
        events.dispatch(&PointerEvent::moved(310.0, 0.0));

        assert!((rotation(&object) - K * 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_teardown_removes_exactly_its_listeners() {
        let (surface, object, drag) = setup();
        let events = surface.pointer_events();
        let other = events.add_listener(PointerEventKind::Move, |_| {});

        let mut handle = attach(&surface, &object, drag, K);
        assert_eq!(events.listener_count(), 5);
        assert!(handle.is_attached());

        handle.teardown();
        handle.teardown();
        assert!(!handle.is_attached());
        assert_eq!(events.listener_count(), 1);
        assert!(events.remove_listener(other));

        events.dispatch(&PointerEvent::down(0.0, 0.0));
        events.dispatch(&PointerEvent::moved(50.0, 0.0));
        assert_eq!(rotation(&object), 0.0);
    }

    #[test]
    fn test_drop_detaches() {
        let (surface, object, drag) = setup();
        {
            let _handle = attach(&surface, &object, drag, K);
            assert_eq!(surface.pointer_events().listener_count(), 4);
        }
        assert_eq!(surface.pointer_events().listener_count(), 0);
    }

    #[test]
    fn test_missing_target_skips_write() {
        let (surface, object, drag) = setup();
        let _handle = attach(&surface, &object, Rc::clone(&drag), K);
        drop(object);

        let events = surface.pointer_events();
        events.dispatch(&PointerEvent::down(0.0, 0.0));
        events.dispatch(&PointerEvent::moved(30.0, 0.0));
        assert!(drag.get().is_dragging());
    }
}
