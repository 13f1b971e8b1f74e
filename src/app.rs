// app.rs
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::input::CameraController;
use crate::renderer::uniforms::{BillboardInstance, FrameUniform};
use crate::renderer::{
    build_mesh_draws, overlay, shadow, surface_error_action, FrameInputs, Renderer, SurfaceAction,
};
use crate::scene::components::Name;
use crate::scene::lights::{billboard_draw_list, update_lights};
use crate::scene::persist;
use crate::scene::picking::{pick, Ray};
use crate::scene::{Camera, Scene};
use crate::settings::RenderSettings;
use crate::ui::{HudState, Ui, UiActions};

/// A frame after a long stall integrates at most this many seconds, so a
/// debugger pause or window drag never catapults the simulation.
const MAX_FRAME_DT: f32 = 0.1;
/// How often the HUD fps/ms readings refresh.
const TELEMETRY_INTERVAL: f32 = 0.2;

const FOV_Y: f32 = 50.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

#[derive(Default)]
struct Telemetry {
    accumulated: f32,
    frames: u32,
    fps: f32,
    frame_ms: f32,
}

impl Telemetry {
    fn tick(&mut self, dt: f32) {
        self.accumulated += dt;
        self.frames += 1;
        if self.accumulated >= TELEMETRY_INTERVAL {
            self.fps = self.frames as f32 / self.accumulated;
            self.frame_ms = self.accumulated * 1000.0 / self.frames as f32;
            self.accumulated = 0.0;
            self.frames = 0;
        }
    }
}

pub struct App {
    window: Option<Arc<Window>>,
    window_id: Option<WindowId>,
    renderer: Option<Renderer>,
    ui: Option<Ui>,
    scene: Scene,
    camera: Camera,
    controller: CameraController,
    settings: RenderSettings,

    selection: Option<hecs::Entity>,
    edit_mode: bool,
    menu_open: bool,

    cursor: Vec2,
    right_dragging: bool,

    last_frame: Instant,
    telemetry: Telemetry,
}

impl App {
    pub fn new() -> Self {
        Self {
            window: None,
            window_id: None,
            renderer: None,
            ui: None,
            scene: Scene::new(),
            camera: Camera::default(),
            controller: CameraController::default(),
            settings: RenderSettings::load(),
            selection: None,
            edit_mode: false,
            menu_open: false,
            cursor: Vec2::ZERO,
            right_dragging: false,
            last_frame: Instant::now(),
            telemetry: Telemetry::default(),
        }
    }

    fn save_transforms(&self) {
        persist::save_to_path(&self.scene.world, &self.settings.transforms_path);
        log::info!("Saved transforms to {:?}", self.settings.transforms_path);
    }

    fn load_transforms(&mut self) {
        persist::load_from_path(&mut self.scene.world, &self.settings.transforms_path);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.save_transforms();
        if let Some(renderer) = &self.renderer {
            renderer.wait_idle();
        }
        event_loop.exit();
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState, event_loop: &ActiveEventLoop) {
        if state == ElementState::Pressed {
            match code {
                KeyCode::F1 => {
                    self.menu_open = !self.menu_open;
                    return;
                }
                KeyCode::F3 => {
                    self.edit_mode = !self.edit_mode;
                    if !self.edit_mode {
                        self.selection = None;
                    }
                    log::info!("Edit mode {}", if self.edit_mode { "on" } else { "off" });
                    return;
                }
                KeyCode::Escape => {
                    self.shutdown(event_loop);
                    return;
                }
                _ => {}
            }
        }
        // The menu owns the keyboard while it is open.
        if !self.menu_open {
            self.controller.process_key(code, state);
        }
    }

    fn pick_under_cursor(&mut self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let (width, height) = renderer.size();
        let ray = Ray::from_cursor(
            self.cursor,
            Vec2::new(width as f32, height as f32),
            self.camera.projection(),
            self.camera.inverse_view(),
        );
        self.selection = pick(&self.scene.world, &ray);
        match self.selection {
            Some(entity) => log::debug!("Picked {:?}", entity),
            None => log::debug!("Pick hit nothing"),
        }
    }

    fn selection_name(&self) -> Option<String> {
        let entity = self.selection?;
        self.scene
            .world
            .get::<&Name>(entity)
            .ok()
            .map(|name| name.0.clone())
    }

    fn apply_ui_actions(&mut self, actions: UiActions, event_loop: &ActiveEventLoop) {
        if actions.reset_camera {
            self.controller.reset();
        }
        if actions.save_transforms {
            self.save_transforms();
        }
        if actions.load_transforms {
            self.load_transforms();
        }
        if actions.quit {
            self.shutdown(event_loop);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(MAX_FRAME_DT);
        self.last_frame = now;

        let selection_name = self.selection_name();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        self.controller.update(dt);
        self.camera
            .set_view_yxz(self.controller.position, self.controller.rotation);
        self.camera.set_perspective_projection(
            FOV_Y.to_radians(),
            renderer.aspect_ratio(),
            NEAR,
            FAR,
        );

        let packed = update_lights(&mut self.scene.world, dt);
        let mut uniform = FrameUniform::new();
        uniform.projection = self.camera.projection().to_cols_array_2d();
        uniform.view = self.camera.view().to_cols_array_2d();
        uniform.inverse_view = self.camera.inverse_view().to_cols_array_2d();
        uniform.light_projection_view = shadow::light_space_matrix().to_cols_array_2d();
        uniform.lights = packed.lights;
        uniform.light_count = packed.count;

        let (mesh_draws, mesh_instances) = build_mesh_draws(&self.scene.world);
        let billboards: Vec<BillboardInstance> =
            billboard_draw_list(&self.scene.world, self.camera.position())
                .into_iter()
                .map(|b| BillboardInstance::new(b.position, b.radius, b.color, b.intensity))
                .collect();
        let overlay_vertices =
            overlay::build_overlay(&self.scene.world, self.selection, self.edit_mode);

        let mut frame = match renderer.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                match surface_error_action(&err) {
                    SurfaceAction::Recreate => {
                        log::warn!("Surface {:?}, reconfiguring", err);
                        renderer.recreate_surface();
                    }
                    SurfaceAction::Skip => log::debug!("Surface timeout, skipping frame"),
                    SurfaceAction::Fatal => {
                        log::error!("Surface error: {:?}", err);
                        self.shutdown(event_loop);
                        return;
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
                return;
            }
        };

        renderer.draw_scene(
            &mut frame,
            &self.scene.assets,
            &FrameInputs {
                uniform,
                mesh_draws: &mesh_draws,
                mesh_instances: &mesh_instances,
                billboards: &billboards,
                overlay: &overlay_vertices,
            },
        );

        self.telemetry.tick(dt);
        let hud = HudState {
            menu_open: self.menu_open,
            edit_mode: self.edit_mode,
            fps: self.telemetry.fps,
            frame_ms: self.telemetry.frame_ms,
            camera_position: self.camera.position(),
            light_count: packed.count,
            selection: selection_name,
        };

        let mut actions = UiActions::default();
        if let (Some(ui), Some(window)) = (self.ui.as_mut(), self.window.as_ref()) {
            let (width, height) = renderer.size();
            actions = ui.render(
                renderer.device(),
                renderer.queue(),
                &mut frame.encoder,
                window,
                &frame.view,
                [width, height],
                &hud,
            );
        }

        renderer.end_frame(frame);
        self.apply_ui_actions(actions, event_loop);

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("forward renderer")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.settings.resolution.width,
                self.settings.resolution.height,
            ));
        let window = Arc::new(event_loop.create_window(attributes).expect("create window"));
        let id = window.id();

        let renderer = pollster::block_on(Renderer::new(window.clone(), &self.settings));
        let ui = Ui::new(renderer.device(), renderer.surface_format(), &window);

        self.scene.populate(&renderer);
        self.load_transforms();

        self.window_id = Some(id);
        self.renderer = Some(renderer);
        self.ui = Some(ui);
        self.last_frame = Instant::now();

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        let mut consumed = false;
        if let (Some(ui), Some(window)) = (self.ui.as_mut(), self.window.as_ref()) {
            consumed = ui.on_window_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(renderer), Some(window)) =
                    (self.renderer.as_mut(), self.window.as_ref())
                {
                    renderer.resize(window.inner_size());
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } if !consumed => {
                self.handle_key(code, state, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let next = Vec2::new(position.x as f32, position.y as f32);
                if self.right_dragging && !consumed && !self.menu_open {
                    self.controller.apply_look(next - self.cursor);
                }
                self.cursor = next;
            }
            WindowEvent::MouseInput { state, button, .. } if !consumed => match button {
                MouseButton::Right => {
                    self.right_dragging = state.is_pressed();
                }
                MouseButton::Left => {
                    if state.is_pressed() && self.edit_mode && !self.menu_open {
                        self.pick_under_cursor();
                    }
                }
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } if !consumed && !self.menu_open => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                self.controller.dolly(amount);
            }
            _ => {}
        }
    }
}
