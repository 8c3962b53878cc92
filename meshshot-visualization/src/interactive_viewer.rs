//! Interactive preview window
//!
//! [`ViewerState`] turns input into camera changes and actions, independent
//! of any window. [`InteractiveViewer`] feeds it winit events and shows the
//! software-rendered frame through a [`FramePresenter`].

use crate::present::FramePresenter;
use meshshot_core::{Error, Result};
use meshshot_render::{frame_to_rgba8, render_frame, RenderContext};
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

/// Degrees of camera rotation per pixel of left-drag
const ORBIT_DEGREES_PER_PIXEL: f32 = 0.4;
/// Zoom factor per wheel line
const ZOOM_PER_LINE: f32 = 1.1;
/// Pixels of touchpad scrolling that count as one wheel line
const PIXELS_PER_LINE: f32 = 50.0;

/// Mouse buttons the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Char(char),
    Escape,
}

/// Window-independent input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Pressed(PointerButton),
    Released(PointerButton),
    CursorMoved { x: f64, y: f64 },
    CursorLeft,
    /// Positive lines scroll away from the user and zoom in
    Scroll(f32),
    Key(ViewerKey),
    Resized { width: u32, height: u32 },
    CloseRequested,
}

/// What the event loop should do after an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Idle,
    Redraw,
    Export,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Orbit,
    Pan,
}

/// Camera interaction over a [`RenderContext`]
#[derive(Debug, Clone)]
pub struct ViewerState {
    ctx: RenderContext,
    drag: Option<Drag>,
    cursor: Option<(f64, f64)>,
}

impl ViewerState {
    pub fn new(ctx: RenderContext) -> Self {
        Self { ctx, drag: None, cursor: None }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn handle(&mut self, input: Input) -> ViewerAction {
        match input {
            Input::Pressed(button) => {
                self.drag = Some(match button {
                    PointerButton::Left => Drag::Orbit,
                    PointerButton::Right | PointerButton::Middle => Drag::Pan,
                });
                ViewerAction::Idle
            }
            Input::Released(_) => {
                self.drag = None;
                ViewerAction::Idle
            }
            Input::CursorMoved { x, y } => {
                let previous = self.cursor.replace((x, y));
                match (self.drag, previous) {
                    (Some(drag), Some((px, py))) => {
                        self.drag_by(drag, (x - px) as f32, (y - py) as f32);
                        ViewerAction::Redraw
                    }
                    _ => ViewerAction::Idle,
                }
            }
            Input::CursorLeft => {
                self.cursor = None;
                ViewerAction::Idle
            }
            Input::Scroll(lines) if lines != 0.0 && lines.is_finite() => {
                self.ctx.camera.zoom(ZOOM_PER_LINE.powf(lines));
                ViewerAction::Redraw
            }
            Input::Scroll(_) => ViewerAction::Idle,
            Input::Resized { width, height } if width > 0 && height > 0 => {
                self.ctx.size = [width, height];
                ViewerAction::Redraw
            }
            Input::Resized { .. } => ViewerAction::Idle,
            Input::Key(ViewerKey::Char('r')) => {
                self.ctx.reset_camera();
                ViewerAction::Redraw
            }
            Input::Key(ViewerKey::Char('e')) => ViewerAction::Export,
            Input::Key(ViewerKey::Char('q') | ViewerKey::Escape) | Input::CloseRequested => {
                ViewerAction::Exit
            }
            Input::Key(_) => ViewerAction::Idle,
        }
    }

    fn drag_by(&mut self, drag: Drag, dx: f32, dy: f32) {
        let camera = &mut self.ctx.camera;
        match drag {
            Drag::Orbit => camera.orbit(dx * ORBIT_DEGREES_PER_PIXEL, -dy * ORBIT_DEGREES_PER_PIXEL),
            Drag::Pan => {
                let units_per_pixel = camera.view_height() / self.ctx.size[1].max(1) as f32;
                camera.pan(-dx * units_per_pixel, dy * units_per_pixel);
            }
        }
    }
}

fn translate(event: &WindowEvent) -> Option<Input> {
    let button = |button: &MouseButton| match button {
        MouseButton::Left => Some(PointerButton::Left),
        MouseButton::Right => Some(PointerButton::Right),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    };

    match event {
        WindowEvent::CloseRequested => Some(Input::CloseRequested),
        WindowEvent::Resized(size) => Some(Input::Resized { width: size.width, height: size.height }),
        WindowEvent::MouseInput { state, button: b, .. } => {
            let b = button(b)?;
            Some(match state {
                ElementState::Pressed => Input::Pressed(b),
                ElementState::Released => Input::Released(b),
            })
        }
        WindowEvent::CursorMoved { position, .. } => Some(Input::CursorMoved { x: position.x, y: position.y }),
        WindowEvent::CursorLeft { .. } => Some(Input::CursorLeft),
        WindowEvent::MouseWheel { delta, .. } => Some(Input::Scroll(match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
        })),
        WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
            match &event.logical_key {
                Key::Named(NamedKey::Escape) => Some(Input::Key(ViewerKey::Escape)),
                Key::Character(text) => text
                    .chars()
                    .next()
                    .map(|c| Input::Key(ViewerKey::Char(c.to_ascii_lowercase()))),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Called with the current view when the user asks for an export; returns
/// the written path
pub type ExportHandler<'a> = Box<dyn FnMut(&RenderContext) -> Result<PathBuf> + 'a>;

/// A window showing the configured mesh
pub struct InteractiveViewer<'a> {
    state: ViewerState,
    title: String,
    on_export: ExportHandler<'a>,
}

impl<'a> InteractiveViewer<'a> {
    pub fn new(ctx: RenderContext, title: impl Into<String>, on_export: ExportHandler<'a>) -> Self {
        Self {
            state: ViewerState::new(ctx),
            title: title.into(),
            on_export,
        }
    }

    /// Run until the window is closed. Nothing is written unless the user
    /// exports.
    pub fn run(self) -> Result<()> {
        let Self { mut state, title, mut on_export } = self;

        let event_loop = EventLoop::new()
            .map_err(|e| Error::RenderSetup(format!("Failed to create event loop: {}", e)))?;
        let [width, height] = state.context().size;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title.as_str())
                .with_inner_size(PhysicalSize::new(width, height))
                .build(&event_loop)
                .map_err(|e| Error::RenderSetup(format!("Failed to create window: {}", e)))?,
        );
        let mut presenter = FramePresenter::new(window.clone())?;

        log::info!("Viewer ready: drag to orbit, right-drag to pan, wheel to zoom, 'r' reset, 'e' export, 'q' quit");

        let mut failure: Option<Error> = None;
        let failure_slot = &mut failure;
        let mut stale = true;

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::Wait);
                let Event::WindowEvent { event, .. } = event else {
                    return;
                };

                if let WindowEvent::RedrawRequested = event {
                    if stale {
                        let [w, h] = state.context().size;
                        match render_frame(state.context(), w, h) {
                            Ok(frame) => presenter.upload(&frame_to_rgba8(&frame)),
                            Err(e) => {
                                *failure_slot = Some(e);
                                target.exit();
                                return;
                            }
                        }
                        stale = false;
                    }
                    if let Err(e) = presenter.present() {
                        *failure_slot = Some(e);
                        target.exit();
                    }
                    return;
                }

                if let WindowEvent::Resized(size) = event {
                    presenter.resize(size.width, size.height);
                }

                let Some(input) = translate(&event) else {
                    return;
                };
                match state.handle(input) {
                    ViewerAction::Idle => {}
                    ViewerAction::Redraw => {
                        stale = true;
                        window.request_redraw();
                    }
                    ViewerAction::Export => match on_export(state.context()) {
                        Ok(path) => log::info!("Exported view to {}", path.display()),
                        Err(e) => log::error!("Export failed: {}", e),
                    },
                    ViewerAction::Exit => target.exit(),
                }
            })
            .map_err(|e| Error::RenderSetup(format!("Event loop error: {}", e)))?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshshot_core::{Point3f, RenderSettings, TriangleMesh};
    use meshshot_render::{configure, Capabilities};

    fn state() -> ViewerState {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 1.0),
            ],
            vec![[0, 1, 2]],
        );
        ViewerState::new(configure(&RenderSettings::default(), mesh, &Capabilities::software()))
    }

    fn drag(state: &mut ViewerState, button: PointerButton, to: (f64, f64)) -> ViewerAction {
        state.handle(Input::CursorMoved { x: 100.0, y: 100.0 });
        state.handle(Input::Pressed(button));
        let action = state.handle(Input::CursorMoved { x: to.0, y: to.1 });
        state.handle(Input::Released(button));
        action
    }

    #[test]
    fn test_left_drag_orbits_around_focal_point() {
        let mut state = state();
        let before = state.context().camera.clone();

        assert_eq!(drag(&mut state, PointerButton::Left, (140.0, 100.0)), ViewerAction::Redraw);

        let after = &state.context().camera;
        assert_relative_eq!(after.focal_point, before.focal_point);
        assert_relative_eq!(after.distance(), before.distance(), epsilon = 1e-4);
        assert!((after.position - before.position).norm() > 1e-3);
    }

    #[test]
    fn test_right_and_middle_drag_pan() {
        for button in [PointerButton::Right, PointerButton::Middle] {
            let mut state = state();
            let before = state.context().camera.clone();
            drag(&mut state, button, (100.0, 130.0));

            let after = &state.context().camera;
            let shift = after.focal_point - before.focal_point;
            assert!(shift.norm() > 1e-4);
            assert_relative_eq!(after.position - before.position, shift, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_moving_without_button_does_nothing() {
        let mut state = state();
        let before = state.context().camera.clone();
        state.handle(Input::CursorMoved { x: 0.0, y: 0.0 });
        assert_eq!(state.handle(Input::CursorMoved { x: 50.0, y: 50.0 }), ViewerAction::Idle);
        assert_eq!(state.context().camera, before);
    }

    #[test]
    fn test_wheel_zooms_and_r_resets() {
        let mut state = state();
        let home = state.context().camera.clone();

        assert_eq!(state.handle(Input::Scroll(2.0)), ViewerAction::Redraw);
        assert!(state.context().camera.view_angle < home.view_angle);

        drag(&mut state, PointerButton::Left, (150.0, 120.0));
        assert_eq!(state.handle(Input::Key(ViewerKey::Char('r'))), ViewerAction::Redraw);
        assert_eq!(state.context().camera, home);
    }

    #[test]
    fn test_export_and_exit_keys() {
        let mut state = state();
        assert_eq!(state.handle(Input::Key(ViewerKey::Char('e'))), ViewerAction::Export);
        assert_eq!(state.handle(Input::Key(ViewerKey::Char('x'))), ViewerAction::Idle);
        assert_eq!(state.handle(Input::Key(ViewerKey::Char('q'))), ViewerAction::Exit);
        assert_eq!(state.handle(Input::Key(ViewerKey::Escape)), ViewerAction::Exit);
        assert_eq!(state.handle(Input::CloseRequested), ViewerAction::Exit);
    }

    #[test]
    fn test_resize_changes_render_size() {
        let mut state = state();
        assert_eq!(state.handle(Input::Resized { width: 640, height: 480 }), ViewerAction::Redraw);
        assert_eq!(state.context().size, [640, 480]);
        assert_eq!(state.handle(Input::Resized { width: 0, height: 480 }), ViewerAction::Idle);
        assert_eq!(state.context().size, [640, 480]);
    }
}
