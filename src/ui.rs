//! egui overlay: the always-on HUD plus the F1 developer menu. Recorded
//! into the frame encoder after the scene passes so it composites on top.

use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

/// Snapshot of what the HUD shows this frame.
pub struct HudState {
    pub menu_open: bool,
    pub edit_mode: bool,
    pub fps: f32,
    pub frame_ms: f32,
    pub camera_position: glam::Vec3,
    pub light_count: u32,
    pub selection: Option<String>,
}

/// Requests the menu made this frame, applied by the app after rendering.
#[derive(Default)]
pub struct UiActions {
    pub reset_camera: bool,
    pub save_transforms: bool,
    pub load_transforms: bool,
    pub quit: bool,
}

pub struct Ui {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Ui {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let viewport_id = ctx.viewport_id();

        let state = egui_winit::State::new(
            ctx.clone(),
            viewport_id,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        // The overlay resolves straight into the single-sampled surface.
        let renderer = egui_wgpu::Renderer::new(device, output_format, None, 1, false);

        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Feeds a window event to egui. Returns true when egui consumed it and
    /// the app should not act on it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Runs the UI for this frame and records it into `encoder`.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        surface_size: [u32; 2],
        hud: &HudState,
    ) -> UiActions {
        let mut actions = UiActions::default();
        if surface_size[0] == 0 || surface_size[1] == 0 {
            return actions;
        }

        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
        draw_hud(&self.ctx, hud, &mut actions);
        let output = self.ctx.end_pass();
        self.state
            .handle_platform_output(window, output.platform_output.clone());

        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: surface_size,
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        self.renderer
            .update_buffers(device, queue, encoder, &primitives, &screen_descriptor);

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("egui pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // egui-wgpu wants a 'static pass; it ends when this binding drops.
        let mut pass = pass.forget_lifetime();
        self.renderer
            .render(&mut pass, &primitives, &screen_descriptor);
        drop(pass);

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        actions
    }
}

fn draw_hud(ctx: &egui::Context, hud: &HudState, actions: &mut UiActions) {
    egui::Window::new("Stats")
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.label(format!("{:.0} fps ({:.2} ms)", hud.fps, hud.frame_ms));
            ui.label(format!(
                "camera {:.2} {:.2} {:.2}",
                hud.camera_position.x, hud.camera_position.y, hud.camera_position.z
            ));
            ui.label(format!("{} lights", hud.light_count));
            if hud.edit_mode {
                ui.colored_label(egui::Color32::YELLOW, "EDIT MODE (F3)");
                match &hud.selection {
                    Some(name) => ui.label(format!("selected: {name}")),
                    None => ui.label("selected: none"),
                };
            }
        });

    if !hud.menu_open {
        return;
    }

    egui::Window::new("Menu")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            if ui.button("Reset camera").clicked() {
                actions.reset_camera = true;
            }
            if ui.button("Save transforms").clicked() {
                actions.save_transforms = true;
            }
            if ui.button("Load transforms").clicked() {
                actions.load_transforms = true;
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                actions.quit = true;
            }
            ui.small("F1 toggles this menu");
        });
}
