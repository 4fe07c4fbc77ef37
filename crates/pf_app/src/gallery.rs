//! Photo gallery: a ring of image panels around a standing viewer, paged
//! eight at a time, with a music toggle and controller support.
//!
//! All state changes happen on the frame loop. Loading happens on worker
//! threads (see `gallery_content`) and is picked up by `drain_loader`.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use pf_core::animation::{Easing, Tween};
use pf_render::{Lighting, Ray};

use crate::audio::BgmToggle;
use crate::gallery_content::{
    spawn_content_fetch, spawn_page_load, AssetSource, ContentRecord, LoadedItem, LoaderMessage,
};
use crate::gallery_layout::{layout_item, page_slice, ItemLayout, LayoutConfig};
use crate::pager::{LoadOutcome, LoadRequest, NextPage, Pager};
use crate::xr_input::{Anchor, ControllerEvent, GalleryAction, XrInputRouter};

pub const CLEAR_COLOR: [f64; 3] = [0.05, 0.05, 0.1];
pub const EYE: Vec3 = Vec3::new(0.0, 1.6, 0.0);
pub const GROUND_SIZE: f32 = 10.0;
pub const GROUND_COLOR: [f32; 4] = [0.2, 0.2, 0.3, 1.0];
pub const PLATE_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.7];
pub const AUDIO_PANEL_SIZE: Vec2 = Vec2::new(0.15, 0.08);
pub const PAGE_PANEL_SIZE: Vec2 = Vec2::new(0.35, 0.1);
pub const AUDIO_ON_COLOR: [f32; 4] = [0.4, 0.8, 1.0, 0.7];
pub const AUDIO_OFF_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 0.7];
pub const PAGE_PANEL_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 0.7];
/// Page transition lift.
pub const LIFT: f32 = 0.5;
/// 60 frames at 60 Hz.
pub const TRANSITION_US: u64 = 1_000_000;
/// Gallery rotation per fixed step while an arrow key is held.
pub const KEY_ROTATE_SPEED: f32 = 0.02;

pub fn lighting() -> Lighting {
    Lighting {
        direction: Vec3::new(0.0, -1.0, -0.5),
        intensity: 0.4,
        ambient: Vec3::ONE,
        ambient_intensity: 0.7,
    }
}

/// Stable id for the GPU resources of one displayed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u64);

#[derive(Debug, Clone)]
enum ItemMotion {
    Still,
    Exiting(Tween),
    /// Exit finished; waiting for the rest of the page.
    Gone,
    Entering(Tween),
}

#[derive(Debug)]
pub struct DisplayedItem {
    pub id: ItemId,
    pub record: ContentRecord,
    pub layout: ItemLayout,
    /// Decoded image until the renderer uploads it.
    pub image: Option<image::RgbaImage>,
    motion: ItemMotion,
}

impl DisplayedItem {
    /// Current `(lift, visibility)` from the page transition.
    pub fn pose(&self) -> (f32, f32) {
        match &self.motion {
            ItemMotion::Still => (0.0, 1.0),
            ItemMotion::Exiting(t) => (LIFT * t.value(), 1.0 - t.value()),
            ItemMotion::Gone => (LIFT, 0.0),
            ItemMotion::Entering(t) => (LIFT * (1.0 - t.value()), t.value()),
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.motion, ItemMotion::Exiting(_) | ItemMotion::Entering(_))
    }
}

pub struct GalleryScene {
    layout: LayoutConfig,
    pager: Pager,
    records: Vec<ContentRecord>,
    items: Vec<DisplayedItem>,
    retired: Vec<ItemId>,
    next_item_id: u64,
    pub gallery_yaw: f32,
    bgm: BgmToggle,
    router: XrInputRouter,
    source: Arc<dyn AssetSource>,
    tx: Sender<LoaderMessage>,
    rx: Receiver<LoaderMessage>,
}

impl GalleryScene {
    pub fn new(source: Arc<dyn AssetSource>, page_size: usize, bgm: BgmToggle) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            layout: LayoutConfig::default(),
            pager: Pager::new(page_size),
            records: Vec::new(),
            items: Vec::new(),
            retired: Vec::new(),
            next_item_id: 0,
            gallery_yaw: 0.0,
            bgm,
            router: XrInputRouter::new(),
            source,
            tx,
            rx,
        }
    }

    /// Kick off the content fetch. Pages load once it reports back.
    pub fn start(&self, content_location: &str) {
        spawn_content_fetch(self.source.clone(), content_location.to_string(), self.tx.clone());
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn items(&self) -> &[DisplayedItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [DisplayedItem] {
        &mut self.items
    }

    pub fn router(&self) -> &XrInputRouter {
        &self.router
    }

    pub fn audio_playing(&self) -> bool {
        self.bgm.is_playing()
    }

    pub fn active_animations(&self) -> usize {
        self.items.iter().filter(|i| i.is_animating()).count()
    }

    /// Items dropped since the last call; their GPU resources can go.
    pub fn take_retired(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.retired)
    }

    pub fn item_transform(&self, item: &DisplayedItem) -> Mat4 {
        item.layout.transform(self.gallery_yaw, item.pose().0)
    }

    pub fn plate_transform(&self, item: &DisplayedItem) -> Mat4 {
        item.layout.plate_transform(self.gallery_yaw, item.pose().0)
    }

    pub fn audio_panel_transform(&self) -> Mat4 {
        self.router.anchor_transform(&self.router.anchors().audio_button)
    }

    pub fn page_panel_transform(&self) -> Mat4 {
        self.router.anchor_transform(&self.router.anchors().page_indicator)
    }

    pub fn audio_panel_color(&self) -> [f32; 4] {
        if self.bgm.is_playing() {
            AUDIO_ON_COLOR
        } else {
            AUDIO_OFF_COLOR
        }
    }

    /// Handle everything the loader threads reported since the last frame.
    pub fn drain_loader(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                LoaderMessage::Content(records) => self.content_arrived(records),
                LoaderMessage::Page { generation, result } => self.page_arrived(generation, result),
            }
        }
    }

    pub fn content_arrived(&mut self, records: Vec<ContentRecord>) {
        self.records = records;
        self.retire_all();
        let request = self.pager.reset(self.records.len());
        self.start_load(request);
    }

    fn start_load(&mut self, request: LoadRequest) {
        let page = page_slice(&self.records, request.page, self.pager.page_size()).to_vec();
        log::debug!(
            "Loading page {} ({} items, generation {})",
            request.page + 1,
            page.len(),
            request.generation
        );
        spawn_page_load(self.source.clone(), page, request.generation, self.tx.clone());
    }

    fn retire_all(&mut self) {
        self.retired.extend(self.items.drain(..).map(|item| item.id));
    }

    pub fn page_arrived(&mut self, generation: u64, result: Result<Vec<LoadedItem>, String>) {
        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                if self.pager.load_failed(generation) {
                    log::error!("Page {} failed to load: {e}", self.pager.page() + 1);
                    self.retire_all();
                }
                return;
            }
        };

        let outcome = self.pager.page_loaded(generation, loaded.len());
        if outcome == LoadOutcome::Stale {
            log::debug!("Discarding stale page load (generation {generation})");
            return;
        }
        self.retire_all();
        if outcome == LoadOutcome::Empty {
            return;
        }

        let count = loaded.len();
        for (index, item) in loaded.into_iter().enumerate() {
            let layout = layout_item(index, count, item.aspect(), &self.layout);
            let motion = if outcome == LoadOutcome::Enter {
                ItemMotion::Entering(Tween::new(0.0, 1.0, TRANSITION_US, Easing::CubicOut))
            } else {
                ItemMotion::Still
            };
            self.next_item_id += 1;
            self.items.push(DisplayedItem {
                id: ItemId(self.next_item_id),
                record: item.record,
                layout,
                image: Some(item.image),
                motion,
            });
        }
        log::info!(
            "Showing page {} / {} ({count} items)",
            self.pager.page() + 1,
            self.pager.total_pages().max(1)
        );
    }

    pub fn request_next_page(&mut self) {
        match self.pager.request_next(self.items.len()) {
            NextPage::Ignored => {}
            NextPage::Exit => {
                for item in &mut self.items {
                    item.motion =
                        ItemMotion::Exiting(Tween::new(0.0, 1.0, TRANSITION_US, Easing::CubicIn));
                }
            }
            NextPage::Load(request) => self.start_load(request),
        }
    }

    pub fn toggle_audio(&mut self) {
        self.bgm.toggle();
    }

    pub fn apply(&mut self, action: GalleryAction) {
        match action {
            GalleryAction::Rotate(delta) => self.gallery_yaw += delta,
            GalleryAction::ToggleAudio => self.toggle_audio(),
            GalleryAction::NextPage => self.request_next_page(),
        }
    }

    pub fn handle_controller(&mut self, event: ControllerEvent) {
        if let Some(action) = self.router.route(event) {
            self.apply(action);
        }
    }

    /// Pointer click. Returns true when it landed on the audio panel.
    pub fn click(&mut self, ray: &Ray) -> bool {
        let half = AUDIO_PANEL_SIZE / 2.0;
        if ray.cast_panel(self.audio_panel_transform(), half).is_some() {
            self.toggle_audio();
            return true;
        }
        false
    }

    /// Advance page transition animations by one fixed step.
    pub fn step(&mut self, dt_us: u64) {
        let mut exits_done = 0;
        let mut entries_done = 0;
        for item in &mut self.items {
            match &mut item.motion {
                ItemMotion::Exiting(tween) => {
                    tween.tick(dt_us);
                    if tween.is_finished() {
                        item.motion = ItemMotion::Gone;
                        exits_done += 1;
                    }
                }
                ItemMotion::Entering(tween) => {
                    tween.tick(dt_us);
                    if tween.is_finished() {
                        item.motion = ItemMotion::Still;
                        entries_done += 1;
                    }
                }
                ItemMotion::Still | ItemMotion::Gone => {}
            }
        }

        for _ in 0..entries_done {
            self.pager.entry_finished();
        }
        for _ in 0..exits_done {
            if let Some(request) = self.pager.exit_finished() {
                self.retire_all();
                self.start_load(request);
            }
        }
        self.router.end_frame();
    }

    pub fn shutdown(&mut self) {
        self.bgm.stop();
        self.retire_all();
    }
}

/// Panel caption anchor: the centre of an anchored panel.
pub fn anchor_origin(router: &XrInputRouter, anchor: &Anchor) -> Vec3 {
    router.anchor_transform(anchor).transform_point3(Vec3::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullPlayer;
    use crate::xr_input::{ControllerButton, Hand};

    struct NoAssets;

    impl AssetSource for NoAssets {
        fn read(&self, reference: &str) -> Result<Vec<u8>, String> {
            Err(format!("Failed to read {reference}: offline"))
        }
    }

    fn scene() -> GalleryScene {
        GalleryScene::new(
            Arc::new(NoAssets),
            8,
            BgmToggle::new(Box::new(NullPlayer::default())),
        )
    }

    fn loaded(n: usize, aspect_w: u32) -> Vec<LoadedItem> {
        (0..n)
            .map(|i| LoadedItem {
                record: ContentRecord {
                    image_url: format!("/images/{i}.jpg"),
                    title: format!("T{i}"),
                },
                image: image::RgbaImage::new(aspect_w, 2),
            })
            .collect()
    }

    fn with_first_page(count: usize) -> GalleryScene {
        let mut scene = scene();
        scene.content_arrived(crate::gallery_content::default_records()[..count].to_vec());
        let generation = scene.pager().generation();
        scene.page_arrived(generation, Ok(loaded(count.min(8), 4)));
        scene
    }

    fn run_transition(scene: &mut GalleryScene) {
        for _ in 0..61 {
            scene.step(16_667);
        }
    }

    #[test]
    fn first_page_shows_without_animation() {
        let scene = with_first_page(16);
        assert_eq!(scene.items().len(), 8);
        assert!(!scene.pager().is_transitioning());
        assert!(scene.items().iter().all(|i| i.pose() == (0.0, 1.0)));
        assert!(scene.items().iter().all(|i| i.image.is_some()));
        assert!((scene.items()[0].layout.height - 0.25).abs() < 1e-6);
    }

    #[test]
    fn next_page_exits_then_reloads() {
        let mut scene = with_first_page(16);
        let old_ids: Vec<ItemId> = scene.items().iter().map(|i| i.id).collect();

        scene.request_next_page();
        scene.step(500_000);
        let (lift, vis) = scene.items()[0].pose();
        assert!(lift > 0.0 && lift < LIFT);
        assert!(vis > 0.0 && vis < 1.0);
        assert_eq!(scene.active_animations(), 8);

        run_transition(&mut scene);
        assert!(scene.items().is_empty());
        assert_eq!(scene.pager().page(), 1);
        let mut retired = scene.take_retired();
        retired.sort();
        assert_eq!(retired, old_ids);

        let generation = scene.pager().generation();
        scene.page_arrived(generation, Ok(loaded(8, 2)));
        assert_eq!(scene.items()[0].pose(), (LIFT, 0.0));
        assert!(scene.pager().is_transitioning());

        run_transition(&mut scene);
        assert!(!scene.pager().is_transitioning());
        assert!(scene.items().iter().all(|i| i.pose() == (0.0, 1.0)));
    }

    #[test]
    fn next_during_transition_is_ignored() {
        let mut scene = with_first_page(16);
        scene.request_next_page();
        scene.step(100_000);
        let before = scene.items()[0].pose();
        scene.request_next_page();
        assert_eq!(scene.items()[0].pose(), before);
        run_transition(&mut scene);
        assert_eq!(scene.pager().page(), 1);
    }

    #[test]
    fn stale_page_is_dropped() {
        let mut scene = with_first_page(16);
        let stale = scene.pager().generation();
        scene.content_arrived(crate::gallery_content::default_records());
        scene.page_arrived(stale, Ok(loaded(3, 4)));
        assert!(scene.items().is_empty());
        assert!(scene.pager().is_transitioning());
    }

    #[test]
    fn failed_page_clears_display() {
        let mut scene = with_first_page(16);
        scene.request_next_page();
        run_transition(&mut scene);
        let generation = scene.pager().generation();
        scene.page_arrived(generation, Err("bad image".into()));
        assert!(scene.items().is_empty());
        assert!(!scene.pager().is_transitioning());
    }

    #[test]
    fn controller_actions_reach_the_scene() {
        let mut scene = with_first_page(16);
        scene.handle_controller(ControllerEvent::Thumbstick {
            hand: Hand::Left,
            x: 0.5,
            y: 0.0,
        });
        assert!((scene.gallery_yaw + 0.025).abs() < 1e-6);

        scene.handle_controller(ControllerEvent::Button {
            hand: Hand::Left,
            button: ControllerButton::Trigger,
            pressed: true,
        });
        assert!(scene.audio_playing());
        assert_eq!(scene.audio_panel_color(), AUDIO_ON_COLOR);

        scene.handle_controller(ControllerEvent::Button {
            hand: Hand::Right,
            button: ControllerButton::Primary,
            pressed: true,
        });
        assert!(scene.pager().is_transitioning());
    }

    #[test]
    fn clicking_audio_panel_toggles_music() {
        let mut scene = scene();
        let ray = Ray::new(EYE, Vec3::new(0.0, 1.5, -1.0) - EYE);
        assert!(scene.click(&ray));
        assert!(scene.audio_playing());

        let miss = Ray::new(EYE, Vec3::new(0.0, 0.0, 1.0));
        assert!(!scene.click(&miss));
        assert!(scene.audio_playing());
    }

    #[test]
    fn shutdown_stops_music_and_releases_items() {
        let mut scene = with_first_page(4);
        scene.toggle_audio();
        scene.shutdown();
        assert!(!scene.audio_playing());
        assert_eq!(scene.take_retired().len(), 4);
    }
}
