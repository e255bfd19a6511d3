//! eframe application hosting one viewer session
//!
//! Each egui frame resizes the viewport to the window, routes pointer input
//! to the render surface, pumps the session and paints the latest frame.

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::events::PointerEvent;
use crate::frame_loop::LoopState;
use crate::gpu::WgpuSurface;
use crate::loader::ObjLoader;
use crate::session::ViewerSession;
use crate::surface::RenderSurface;
use crate::viewport::Viewport;
use eframe::egui;
use egui::{Color32, Pos2, Rect};
use log::info;
use std::rc::Rc;
use std::time::Duration;

/// Turns egui input events into surface pointer events.
///
/// Coordinates are in logical points relative to the surface rect, so drag
/// sensitivity does not depend on the display scale factor.
#[derive(Debug, Default)]
pub struct PointerTranslator {
    inside: bool,
}

impl PointerTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, events: &[egui::Event], rect: Rect) -> Vec<PointerEvent> {
        let local = |pos: Pos2| {
            let v = pos - rect.min;
            (v.x, v.y)
        };

        let mut out = Vec::new();
        for event in events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } if rect.contains(*pos) => {
                    let (x, y) = local(*pos);
                    out.push(if *pressed { PointerEvent::down(x, y) } else { PointerEvent::up(x, y) });
                }
                egui::Event::PointerMoved(pos) => {
                    let (x, y) = local(*pos);
                    if rect.contains(*pos) {
                        self.inside = true;
                        out.push(PointerEvent::moved(x, y));
                    } else if self.inside {
                        self.inside = false;
                        out.push(PointerEvent::leave(x, y));
                    }
                }
                egui::Event::PointerGone if self.inside => {
                    self.inside = false;
                    out.push(PointerEvent::leave(0.0, 0.0));
                }
                _ => {}
            }
        }
        out
    }
}

pub struct ViewerApp {
    session: ViewerSession<WgpuSurface>,
    viewport: Rc<Viewport>,
    pointer: PointerTranslator,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Result<Self> {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let ppp = cc.egui_ctx.pixels_per_point();
        let [w, h] = config.window_size;
        let viewport = Rc::new(Viewport::new((w * ppp) as u32, (h * ppp) as u32));

        let render_state = cc.wgpu_render_state.as_ref();
        let session = ViewerSession::mount(
            config,
            Rc::clone(&viewport),
            |width, height| WgpuSurface::create(render_state, width, height),
            &ObjLoader,
        )?;

        Ok(Self {
            session,
            viewport,
            pointer: PointerTranslator::new(),
        })
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let ppp = ctx.pixels_per_point();
        let rect = ctx.screen_rect();
        let size = rect.size() * ppp;
        self.viewport.resize(size.x.round() as u32, size.y.round() as u32);

        let events = ctx.input(|i| i.events.clone());
        let pointer_events = self.pointer.translate(&events, rect);
        if !pointer_events.is_empty() {
            let target = self.session.surface().borrow().pointer_events();
            for event in &pointer_events {
                target.dispatch(event);
            }
        }

        let wants_frames = self.session.pump();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(Color32::from_gray(12)))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                if let Some(callback) = self.session.surface().borrow().paint_callback(rect) {
                    ui.painter().add(callback);
                }
                if let Some(e) = self.session.load_error() {
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        e.to_string(),
                        egui::FontId::proportional(14.0),
                        Color32::LIGHT_RED,
                    );
                }
            });

        if wants_frames {
            if self.session.loop_state() == LoopState::Running {
                ctx.request_repaint();
            } else {
                // Still waiting on the asset
                ctx.request_repaint_after(Duration::from_millis(16));
            }
        }
    }
}

impl Drop for ViewerApp {
    fn drop(&mut self) {
        info!("Closing viewer");
        self.session.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PointerEventKind;

    fn rect() -> Rect {
        Rect::from_min_size(Pos2::new(10.0, 20.0), egui::vec2(200.0, 100.0))
    }

    fn press(x: f32, y: f32, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos: Pos2::new(x, y),
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    #[test]
    fn test_translate_press_move_release() {
        let mut translator = PointerTranslator::new();
        let events = [
            press(20.0, 30.0, true),
            egui::Event::PointerMoved(Pos2::new(25.0, 30.0)),
            press(25.0, 30.0, false),
        ];
        let out = translator.translate(&events, rect());

        let kinds: Vec<_> = out.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PointerEventKind::Down, PointerEventKind::Move, PointerEventKind::Up]);
        assert_eq!((out[0].x, out[0].y), (10.0, 10.0));
        assert_eq!(out[1].x, 15.0);
    }

    #[test]
    fn test_drag_delta_is_in_logical_points() {
        let mut translator = PointerTranslator::new();
        let events = [press(100.0, 100.0, true), egui::Event::PointerMoved(Pos2::new(110.0, 100.0))];
        let out = translator.translate(&events, rect());

        assert_eq!(out[1].x - out[0].x, 10.0);
    }

    #[test]
    fn test_leaving_rect_emits_single_leave() {
        let mut translator = PointerTranslator::new();
        let events = [
            egui::Event::PointerMoved(Pos2::new(50.0, 50.0)),
            egui::Event::PointerMoved(Pos2::new(500.0, 50.0)),
            egui::Event::PointerMoved(Pos2::new(600.0, 50.0)),
            egui::Event::PointerGone,
        ];
        let out = translator.translate(&events, rect());

        let kinds: Vec<_> = out.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PointerEventKind::Move, PointerEventKind::Leave]);
    }

    #[test]
    fn test_presses_outside_rect_are_ignored() {
        let mut translator = PointerTranslator::new();
        let out = translator.translate(&[press(0.0, 0.0, true), press(0.0, 0.0, false)], rect());
        assert!(out.is_empty());
    }

    #[test]
    fn test_pointer_gone_leaves_when_inside() {
        let mut translator = PointerTranslator::new();
        translator.translate(&[egui::Event::PointerMoved(Pos2::new(50.0, 50.0))], rect());
        let out = translator.translate(&[egui::Event::PointerGone], rect());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, PointerEventKind::Leave);
    }
}
