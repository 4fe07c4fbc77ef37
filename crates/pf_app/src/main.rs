//! Portfolio scenes: entry point and main loop.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All simulation
//! runs inside `RedrawRequested` using a **fixed-timestep** model (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, drain loader and controller events
//!   2. `while should_step()` -- consume fixed-dt slices for the active scene
//!   3. Mirror scene state into GPU objects (`SceneRenderer::sync_*`)
//!   4. Draw the scene, composite the egui HUD, apply HUD button actions
//!
//! `portfolio posts ...` skips the window entirely and talks to the blog API.

mod audio;
mod bubbles;
mod config;
mod deform;
mod gallery;
mod gallery_content;
mod gallery_layout;
mod gamepad;
mod motion;
mod pager;
mod posts;
mod renderer;
mod xr_input;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use audio::BgmToggle;
use bubbles::BubblesScene;
use config::AppConfig;
use gallery::GalleryScene;
use gallery_content::WebAssets;
use gamepad::ControllerBackend;
use pf_core::input::{InputState, Key, MouseBtn};
use pf_core::time::TimeState;
use pf_overlay::{HudModel, HudStats, ScreenLabel};
use pf_platform::window::PlatformConfig;
use pf_render::{Camera3D, Lighting};
use posts::PostsCommand;
use renderer::SceneRenderer;

/// Radians per pixel of mouse drag on the bubbles camera.
const DRAG_SENSITIVITY: f32 = 0.005;
/// Used when the environment backdrop is unavailable.
const FALLBACK_AMBIENT: Vec3 = Vec3::ONE;

#[derive(Parser, Debug)]
#[command(name = "portfolio", version, about = "Portfolio 3D scenes and blog client")]
struct Cli {
    /// Settings file (optional; defaults apply when it is missing)
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory that asset references resolve against
    #[arg(long, global = true)]
    web_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Floating bubbles you can poke (default)
    Bubbles,
    /// Ring photo gallery with paging and music
    Gallery,
    /// Blog content API
    Posts {
        #[command(subcommand)]
        action: PostsCommand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneKind {
    Bubbles,
    Gallery,
}

impl SceneKind {
    fn title(self) -> &'static str {
        match self {
            Self::Bubbles => "Portfolio - Bubbles",
            Self::Gallery => "Portfolio - Gallery",
        }
    }
}

enum ActiveScene {
    Bubbles {
        scene: BubblesScene,
        lighting: Lighting,
    },
    Gallery {
        scene: GalleryScene,
    },
}

/// Everything that exists while the window is up. Built in `resumed`,
/// dropped once on exit.
struct AppState {
    renderer: SceneRenderer,
    time: TimeState,
    input: InputState,
    scene: ActiveScene,
    controllers: Box<dyn ControllerBackend>,
}

impl AppState {
    fn new(
        mut renderer: SceneRenderer,
        kind: SceneKind,
        config: &AppConfig,
    ) -> Result<Self, String> {
        let scene = match kind {
            SceneKind::Bubbles => {
                let scene = BubblesScene::new(config.bubble_count, config.sphere_segments)?;
                let ambient = renderer
                    .load_environment(&config.resolve(&config.environment))
                    .unwrap_or(FALLBACK_AMBIENT);
                ActiveScene::Bubbles {
                    scene,
                    lighting: bubbles::lighting(ambient),
                }
            }
            SceneKind::Gallery => {
                let source = Arc::new(WebAssets::new(&config.web_root));
                let bgm = BgmToggle::new(audio::open_player(&config.resolve(&config.bgm)));
                let scene = GalleryScene::new(source, config.page_size, bgm);
                scene.start(&config.content_location);
                ActiveScene::Gallery { scene }
            }
        };
        Ok(Self {
            renderer,
            time: TimeState::new(),
            input: InputState::new(),
            scene,
            controllers: gamepad::open_backend(),
        })
    }

    fn shutdown(&mut self) {
        if let ActiveScene::Gallery { scene } = &mut self.scene {
            scene.shutdown();
            for id in scene.take_retired() {
                self.renderer.remove(renderer::ObjectKey::Item(id));
                self.renderer.remove(renderer::ObjectKey::Plate(id));
            }
        }
    }

    fn camera(&self) -> Camera3D {
        let size = self.renderer.gpu.size;
        match &self.scene {
            ActiveScene::Bubbles { scene, .. } => scene.camera.camera(size),
            ActiveScene::Gallery { .. } => {
                Camera3D::new(gallery::EYE, gallery::EYE + Vec3::NEG_Z, size.0, size.1)
            }
        }
    }

    fn cursor(&self) -> Vec2 {
        let (x, y) = self.input.mouse_position;
        Vec2::new(x as f32, y as f32)
    }

    /// One redraw: simulate, sync, draw. Returns false when the app should exit.
    fn frame(&mut self) -> bool {
        self.time.begin_frame();

        // Frame boundary: pick up loader results and controller events.
        let controller_events = self.controllers.poll();
        if let ActiveScene::Gallery { scene } = &mut self.scene {
            scene.drain_loader();
            for event in controller_events {
                scene.handle_controller(event);
            }
        }

        let dt_us = self.time.fixed_dt_us();
        let mut dirty = Vec::new();
        while self.time.should_step() {
            // Edges are consumed on the first step of a frame.
            let first_step = self.time.steps_this_frame == 1;
            if first_step && self.input.is_just_pressed(Key::Escape) {
                log::info!("Escape pressed, exiting.");
                return false;
            }
            if first_step && self.input.is_just_pressed(Key::F3) {
                self.renderer.hud.toggle_debug();
            }
            let clicked = first_step && self.input.is_mouse_just_pressed(MouseBtn::Left);
            let camera = self.camera();
            let cursor = self.cursor();

            match &mut self.scene {
                ActiveScene::Bubbles { scene, .. } => {
                    if clicked {
                        if let Some((id, outcome)) = scene.tap(&camera.screen_ray(cursor)) {
                            log::debug!("Tapped {id:?}: {outcome:?}");
                        }
                    }
                    if first_step && self.input.is_mouse_held(MouseBtn::Left) {
                        let (dx, dy) = self.input.drag_delta;
                        scene.camera.apply_drag(dx, dy, DRAG_SENSITIVITY);
                    }
                    dirty.extend(scene.step(dt_us));
                }
                ActiveScene::Gallery { scene } => {
                    if first_step && self.input.is_just_pressed(Key::N) {
                        scene.request_next_page();
                    }
                    if first_step && self.input.is_just_pressed(Key::M) {
                        scene.toggle_audio();
                    }
                    if self.input.is_held(Key::Left) {
                        scene.gallery_yaw += gallery::KEY_ROTATE_SPEED;
                    }
                    if self.input.is_held(Key::Right) {
                        scene.gallery_yaw -= gallery::KEY_ROTATE_SPEED;
                    }
                    if clicked {
                        scene.click(&camera.screen_ray(cursor));
                    }
                    scene.step(dt_us);
                }
            }
        }
        if self.time.steps_this_frame > 0 {
            self.input.end_frame();
        }

        let camera = self.camera();
        let (clear, lighting, model, active_animations) = match &mut self.scene {
            ActiveScene::Bubbles { scene, lighting } => {
                self.renderer.sync_bubbles(scene, &dirty);
                (
                    bubbles::CLEAR_COLOR,
                    *lighting,
                    HudModel::Bubbles {
                        prompt: bubbles::PROMPT.to_string(),
                    },
                    scene.active_animations(),
                )
            }
            ActiveScene::Gallery { scene } => {
                self.renderer.sync_gallery(scene);
                (
                    gallery::CLEAR_COLOR,
                    gallery::lighting(),
                    gallery_hud(scene, &camera),
                    scene.active_animations(),
                )
            }
        };

        let mut stats = HudStats {
            scene_label: match self.scene {
                ActiveScene::Bubbles { .. } => "bubbles".to_string(),
                ActiveScene::Gallery { .. } => "gallery".to_string(),
            },
            object_count: self.renderer.object_count(),
            active_animations,
            draw_calls: 0,
        };
        let actions = self
            .renderer
            .render(&self.time, clear, &camera, &lighting, &model, &mut stats);

        if let ActiveScene::Gallery { scene } = &mut self.scene {
            if actions.toggle_audio {
                scene.toggle_audio();
            }
            if actions.next_page {
                scene.request_next_page();
            }
        }
        true
    }
}

fn gallery_hud(scene: &GalleryScene, camera: &Camera3D) -> HudModel {
    let pager = scene.pager();
    let mut labels = Vec::new();
    let mut pin = |world: Vec3, text: String, size: f32| {
        if let Some(p) = camera.world_to_screen(world) {
            labels.push(ScreenLabel {
                x: p.x,
                y: p.y,
                text,
                size,
            });
        }
    };
    for item in scene.items() {
        if item.pose().1 <= 0.05 {
            continue;
        }
        let plate = scene.plate_transform(item).transform_point3(Vec3::ZERO);
        pin(plate, item.record.title.clone(), 14.0);
    }
    let router = scene.router();
    pin(
        gallery::anchor_origin(router, &router.anchors().audio_button),
        pf_overlay::hud::audio_label(scene.audio_playing()).to_string(),
        12.0,
    );
    pin(
        gallery::anchor_origin(router, &router.anchors().page_indicator),
        pf_overlay::hud::page_label(pager.page(), pager.total_pages()),
        14.0,
    );

    HudModel::Gallery {
        page: pager.page(),
        total_pages: pager.total_pages(),
        audio_playing: scene.audio_playing(),
        transitioning: pager.is_transitioning(),
        labels,
    }
}

struct App {
    platform: PlatformConfig,
    config: AppConfig,
    kind: SceneKind,
    state: Option<AppState>,
}

impl App {
    fn new(kind: SceneKind, config: AppConfig) -> Self {
        Self {
            platform: PlatformConfig::with_title(kind.title()),
            config,
            kind,
            state: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<AppState, String> {
        let window = pf_platform::window::create_window(event_loop, &self.platform)?;
        let renderer = SceneRenderer::new(window)?;
        AppState::new(renderer, self.kind, &self.config)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(state) => {
                log::info!("Scene started: {:?}", self.kind);
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("Scene initialisation failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.renderer.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let window = state.renderer.window.clone();
        let egui_consumed = state.renderer.hud.handle_window_event(&window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                state.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.renderer.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.cursor_moved(position.x, position.y);
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                let Some(btn) = map_mouse(button) else {
                    return;
                };
                // Clicks on HUD widgets are not scene picks.
                let over_hud = egui_consumed || state.renderer.hud.wants_pointer();
                match button_state {
                    ElementState::Pressed if !over_hud => state.input.mouse_down(btn),
                    ElementState::Pressed => {}
                    ElementState::Released => state.input.mouse_up(btn),
                }
            }

            WindowEvent::RedrawRequested => {
                if !state.frame() {
                    state.shutdown();
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.shutdown();
            log::info!("Scene closed");
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::KeyN => Some(Key::N),
        KeyCode::KeyM => Some(Key::M),
        _ => None,
    }
}

fn map_mouse(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

fn run_scene(kind: SceneKind, config: AppConfig) {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(kind, config);
    event_loop.run_app(&mut app).expect("Event loop error");
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env loaded: {e}");
    }

    let mut config = match config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    if let Some(web_root) = cli.web_root {
        config.web_root = web_root;
    }

    match cli.command.unwrap_or(Command::Bubbles) {
        Command::Posts { action } => {
            if let Err(e) = posts::run(&action) {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
        Command::Bubbles => {
            log::info!("Portfolio starting: bubbles");
            run_scene(SceneKind::Bubbles, config);
        }
        Command::Gallery => {
            log::info!("Portfolio starting: gallery");
            run_scene(SceneKind::Gallery, config);
        }
    }
}
