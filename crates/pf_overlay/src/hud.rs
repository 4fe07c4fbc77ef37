//! Scene HUD and debug window rendered via egui on top of the 3D scene.
//!
//! Integration pattern: egui requires a split render because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! The scene panel (bubble prompt, or the gallery's music and page
//! controls) is always drawn. The debug window only appears when
//! `debug_visible` is set (toggled by F3).

use pf_core::time::TimeState;
use winit::window::Window;

/// What the scene wants the HUD to show this frame.
#[derive(Debug, Clone)]
pub enum HudModel {
    Bubbles {
        prompt: String,
    },
    Gallery {
        /// Zero-based page index.
        page: usize,
        total_pages: usize,
        audio_playing: bool,
        transitioning: bool,
        /// Text pinned to 3D objects (titles, panel captions).
        labels: Vec<ScreenLabel>,
    },
}

/// Text drawn at a window position, in physical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLabel {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub size: f32,
}

#[derive(Debug, Clone, Default)]
pub struct HudStats {
    pub scene_label: String,
    pub object_count: usize,
    pub active_animations: usize,
    pub draw_calls: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HudActions {
    pub toggle_audio: bool,
    pub next_page: bool,
}

pub fn audio_label(playing: bool) -> &'static str {
    if playing {
        "\u{266a} BGM ON"
    } else {
        "BGM OFF"
    }
}

/// One-based page indicator, e.g. "Page 1 / 2". An empty gallery still
/// reads as page 1 of 1.
pub fn page_label(page: usize, total_pages: usize) -> String {
    format!("Page {} / {}", page + 1, total_pages.max(1))
}

pub struct Hud {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl Hud {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    /// Returns true when egui consumed the event (e.g. a click on a button),
    /// in which case the scene must not also treat it as a pick.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn wants_pointer(&self) -> bool {
        self.egui_ctx.wants_pointer_input() || self.egui_ctx.is_pointer_over_area()
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!("Debug window: {}", if self.debug_visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        model: &HudModel,
        stats: &HudStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        HudActions,
    ) {
        let mut actions = HudActions::default();
        let debug_visible = self.debug_visible;
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            match model {
                HudModel::Bubbles { prompt } => {
                    egui::Area::new(egui::Id::new("bubbles_prompt"))
                        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -20.0])
                        .interactable(false)
                        .show(ctx, |ui| {
                            ui.label(
                                egui::RichText::new(prompt)
                                    .size(24.0)
                                    .color(egui::Color32::BLACK),
                            );
                        });
                }
                HudModel::Gallery {
                    page,
                    total_pages,
                    audio_playing,
                    transitioning,
                    labels,
                } => {
                    let painter = ctx.layer_painter(egui::LayerId::new(
                        egui::Order::Background,
                        egui::Id::new("gallery_labels"),
                    ));
                    let ppp = ctx.pixels_per_point();
                    for label in labels {
                        painter.text(
                            egui::pos2(label.x / ppp, label.y / ppp),
                            egui::Align2::CENTER_CENTER,
                            &label.text,
                            egui::FontId::proportional(label.size),
                            egui::Color32::WHITE,
                        );
                    }
                    egui::Area::new(egui::Id::new("gallery_controls"))
                        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -24.0])
                        .show(ctx, |ui| {
                            ui.horizontal(|ui| {
                                if ui.button(audio_label(*audio_playing)).clicked() {
                                    actions.toggle_audio = true;
                                }
                                ui.label(page_label(*page, *total_pages));
                                let next =
                                    ui.add_enabled(!*transitioning, egui::Button::new("Next"));
                                if next.clicked() {
                                    actions.next_page = true;
                                }
                            });
                        });
                }
            }

            if debug_visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                        ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                        ui.label(format!("Total steps: {}", time.fixed_step_count));
                        ui.label(format!("Frame: {}", time.frame_count));
                        ui.separator();
                        ui.label(format!("Scene: {}", stats.scene_label));
                        ui.label(format!("Objects: {}", stats.object_count));
                        ui.label(format!("Animations: {}", stats.active_animations));
                        ui.label(format!("Draw calls: {}", stats.draw_calls));
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
