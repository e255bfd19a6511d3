//! Single-threaded event listener registry
//!
//! Plays the role of a DOM event target: handlers are registered per event
//! kind and removed by the id returned at registration.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// An event that can be routed by kind
pub trait Event {
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Listener<E: Event> {
    id: ListenerId,
    kind: E::Kind,
    handler: Handler<E>,
}

pub struct EventTarget<E: Event> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Listener<E>>>,
}

impl<E: Event> Default for EventTarget<E> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<E: Event> fmt::Debug for EventTarget<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl<E: Event> EventTarget<E> {
    /// Create a target with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`; the id removes it again
    pub fn add_listener(&self, kind: E::Kind, handler: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            kind,
            handler: Rc::new(RefCell::new(handler)),
        });
        id
    }

    /// Returns false when no listener with this id is registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        listeners.len() != before
    }

    /// Invoke every handler registered for the event's kind, in registration order
    pub fn dispatch(&self, event: &E) {
        // Snapshot first so handlers may add or remove listeners
        let handlers: Vec<Handler<E>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.kind == event.kind())
            .map(|listener| Rc::clone(&listener.handler))
            .collect();

        for handler in handlers {
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (*handler)(event);
            }
        }
    }

    /// Number of registered listeners across all kinds
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Viewport size change, in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub width: u32,
    pub height: u32,
}

impl Event for ResizeEvent {
    type Kind = ();

    fn kind(&self) -> Self::Kind {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Leave,
}

/// Primary-pointer event in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    /// Primary button pressed
    pub fn down(x: f32, y: f32) -> Self {
        Self { kind: PointerEventKind::Down, x, y }
    }

    /// Pointer moved
    pub fn moved(x: f32, y: f32) -> Self {
        Self { kind: PointerEventKind::Move, x, y }
    }

    /// Primary button released
    pub fn up(x: f32, y: f32) -> Self {
        Self { kind: PointerEventKind::Up, x, y }
    }

    /// Pointer left the surface
    pub fn leave(x: f32, y: f32) -> Self {
        Self { kind: PointerEventKind::Leave, x, y }
    }
}

impl Event for PointerEvent {
    type Kind = PointerEventKind;

    fn kind(&self) -> PointerEventKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_kind() {
        let target = EventTarget::<PointerEvent>::new();
        let downs = Rc::new(Cell::new(0));
        let moves = Rc::new(Cell::new(0));

        let d = Rc::clone(&downs);
        target.add_listener(PointerEventKind::Down, move |_| d.set(d.get() + 1));
        let m = Rc::clone(&moves);
        target.add_listener(PointerEventKind::Move, move |_| m.set(m.get() + 1));

        target.dispatch(&PointerEvent::down(0.0, 0.0));
        target.dispatch(&PointerEvent::moved(1.0, 0.0));
        target.dispatch(&PointerEvent::moved(2.0, 0.0));
        target.dispatch(&PointerEvent::up(2.0, 0.0));

        assert_eq!(downs.get(), 1);
        assert_eq!(moves.get(), 2);
    }

    #[test]
    fn test_remove_listener() {
        let target = EventTarget::<ResizeEvent>::new();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let id = target.add_listener((), move |_| c.set(c.get() + 1));

        target.dispatch(&ResizeEvent { width: 10, height: 10 });
        assert!(target.remove_listener(id));
        assert!(!target.remove_listener(id));
        target.dispatch(&ResizeEvent { width: 20, height: 20 });

        assert_eq!(calls.get(), 1);
        assert_eq!(target.listener_count(), 0);
    }

    #[test]
    fn test_handler_can_remove_itself() {
        let target = Rc::new(EventTarget::<ResizeEvent>::new());
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let t = Rc::clone(&target);
        let s = Rc::clone(&slot);
        let id = target.add_listener((), move |_| {
            if let Some(id) = s.get() {
                t.remove_listener(id);
            }
        });
        slot.set(Some(id));

        target.dispatch(&ResizeEvent { width: 1, height: 1 });
        assert_eq!(target.listener_count(), 0);
    }
}
