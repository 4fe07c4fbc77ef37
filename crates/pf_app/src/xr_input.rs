//! Routes motion-controller events to gallery actions and tracks where the
//! controller-mounted UI panels are attached.
//!
//! The left controller carries the music button and its trigger toggles
//! playback; the right controller carries the page indicator and its
//! primary button turns the page. Either thumbstick spins the gallery.
//! Buttons act on the press edge only, so a backend that repeats "pressed"
//! reports while a button is held still produces one action.

use std::f32::consts::FRAC_PI_4;

use glam::{Mat4, Quat, Vec3};
use pf_core::input::EdgeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerButton {
    Trigger,
    /// "A" on the right controller.
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    Connected(Hand),
    Disconnected(Hand),
    Thumbstick { hand: Hand, x: f32, y: f32 },
    Button {
        hand: Hand,
        button: ControllerButton,
        pressed: bool,
    },
    /// Tracked grip pose, in world space.
    Pose { hand: Hand, pose: Pose },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GalleryAction {
    Rotate(f32),
    ToggleAudio,
    NextPage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const fn at(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

/// Where a UI panel hangs: fixed in the world or on a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    World(Pose),
    Controller { hand: Hand, local: Pose },
}

pub const AUDIO_BUTTON_HOME: Vec3 = Vec3::new(0.0, 1.5, -1.0);
pub const PAGE_INDICATOR_HOME: Vec3 = Vec3::new(0.0, 1.2, -1.0);
const AUDIO_BUTTON_MOUNT: Vec3 = Vec3::new(0.0, 0.05, 0.1);
const PAGE_INDICATOR_MOUNT: Vec3 = Vec3::new(0.0, 0.07, 0.1);

fn mount(offset: Vec3) -> Pose {
    Pose {
        translation: offset,
        rotation: Quat::from_rotation_x(FRAC_PI_4),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiAnchors {
    pub audio_button: Anchor,
    pub page_indicator: Anchor,
}

impl Default for UiAnchors {
    fn default() -> Self {
        Self {
            audio_button: Anchor::World(Pose::at(AUDIO_BUTTON_HOME)),
            page_indicator: Anchor::World(Pose::at(PAGE_INDICATOR_HOME)),
        }
    }
}

impl UiAnchors {
    pub fn attach(&mut self, hand: Hand) {
        match hand {
            Hand::Left => {
                self.audio_button = Anchor::Controller {
                    hand,
                    local: mount(AUDIO_BUTTON_MOUNT),
                }
            }
            Hand::Right => {
                self.page_indicator = Anchor::Controller {
                    hand,
                    local: mount(PAGE_INDICATOR_MOUNT),
                }
            }
        }
    }

    /// Put back whatever was mounted on `hand` at its world-fixed pose.
    pub fn detach(&mut self, hand: Hand) {
        match hand {
            Hand::Left => self.audio_button = Anchor::World(Pose::at(AUDIO_BUTTON_HOME)),
            Hand::Right => self.page_indicator = Anchor::World(Pose::at(PAGE_INDICATOR_HOME)),
        }
    }
}

pub struct XrInputRouter {
    pub dead_zone: f32,
    pub rotate_speed: f32,
    buttons: EdgeSet<(Hand, ControllerButton)>,
    anchors: UiAnchors,
    left_pose: Pose,
    right_pose: Pose,
}

impl XrInputRouter {
    pub fn new() -> Self {
        Self {
            dead_zone: 0.1,
            rotate_speed: 0.05,
            buttons: EdgeSet::new(),
            anchors: UiAnchors::default(),
            // Resting hand positions until a backend reports tracking.
            left_pose: Pose::at(Vec3::new(-0.2, 1.2, -0.4)),
            right_pose: Pose::at(Vec3::new(0.2, 1.2, -0.4)),
        }
    }

    pub fn anchors(&self) -> &UiAnchors {
        &self.anchors
    }

    pub fn hand_pose(&self, hand: Hand) -> Pose {
        match hand {
            Hand::Left => self.left_pose,
            Hand::Right => self.right_pose,
        }
    }

    /// World transform of an anchored panel.
    pub fn anchor_transform(&self, anchor: &Anchor) -> Mat4 {
        match anchor {
            Anchor::World(pose) => pose.matrix(),
            Anchor::Controller { hand, local } => self.hand_pose(*hand).matrix() * local.matrix(),
        }
    }

    pub fn route(&mut self, event: ControllerEvent) -> Option<GalleryAction> {
        match event {
            ControllerEvent::Connected(hand) => {
                log::info!("{hand:?} controller connected");
                self.anchors.attach(hand);
                None
            }
            ControllerEvent::Disconnected(hand) => {
                log::info!("{hand:?} controller disconnected");
                self.anchors.detach(hand);
                for button in [ControllerButton::Trigger, ControllerButton::Primary] {
                    self.buttons.release((hand, button));
                }
                None
            }
            ControllerEvent::Thumbstick { x, .. } => {
                (x.abs() > self.dead_zone).then(|| GalleryAction::Rotate(-x * self.rotate_speed))
            }
            ControllerEvent::Button {
                hand,
                button,
                pressed,
            } => {
                let edge = self.buttons.set((hand, button), pressed);
                if !(edge && pressed) {
                    return None;
                }
                match (hand, button) {
                    (Hand::Left, ControllerButton::Trigger) => Some(GalleryAction::ToggleAudio),
                    (Hand::Right, ControllerButton::Primary) => Some(GalleryAction::NextPage),
                    _ => None,
                }
            }
            ControllerEvent::Pose { hand, pose } => {
                match hand {
                    Hand::Left => self.left_pose = pose,
                    Hand::Right => self.right_pose = pose,
                }
                None
            }
        }
    }

    pub fn end_frame(&mut self) {
        self.buttons.end_frame();
    }
}

impl Default for XrInputRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(hand: Hand, button: ControllerButton, pressed: bool) -> ControllerEvent {
        ControllerEvent::Button {
            hand,
            button,
            pressed,
        }
    }

    #[test]
    fn thumbstick_dead_zone() {
        let mut router = XrInputRouter::new();
        let small = ControllerEvent::Thumbstick {
            hand: Hand::Left,
            x: 0.05,
            y: 0.0,
        };
        assert_eq!(router.route(small), None);

        let big = ControllerEvent::Thumbstick {
            hand: Hand::Right,
            x: 0.5,
            y: 0.9,
        };
        match router.route(big) {
            Some(GalleryAction::Rotate(r)) => assert!((r + 0.025).abs() < 1e-6),
            other => panic!("expected rotation, got {other:?}"),
        }
    }

    #[test]
    fn repeated_trigger_report_toggles_once() {
        let mut router = XrInputRouter::new();
        assert_eq!(
            router.route(press(Hand::Left, ControllerButton::Trigger, true)),
            Some(GalleryAction::ToggleAudio)
        );
        assert_eq!(router.route(press(Hand::Left, ControllerButton::Trigger, true)), None);
        assert_eq!(router.route(press(Hand::Left, ControllerButton::Trigger, false)), None);
        assert_eq!(
            router.route(press(Hand::Left, ControllerButton::Trigger, true)),
            Some(GalleryAction::ToggleAudio)
        );
    }

    #[test]
    fn buttons_are_bound_per_hand() {
        let mut router = XrInputRouter::new();
        assert_eq!(
            router.route(press(Hand::Right, ControllerButton::Primary, true)),
            Some(GalleryAction::NextPage)
        );
        assert_eq!(router.route(press(Hand::Right, ControllerButton::Trigger, true)), None);
        assert_eq!(router.route(press(Hand::Left, ControllerButton::Primary, true)), None);
    }

    #[test]
    fn connect_mounts_and_disconnect_restores() {
        let mut router = XrInputRouter::new();
        router.route(ControllerEvent::Connected(Hand::Left));
        match router.anchors().audio_button {
            Anchor::Controller { hand, local } => {
                assert_eq!(hand, Hand::Left);
                assert_eq!(local.translation, Vec3::new(0.0, 0.05, 0.1));
            }
            other => panic!("audio button not mounted: {other:?}"),
        }
        assert_eq!(
            router.anchors().page_indicator,
            Anchor::World(Pose::at(PAGE_INDICATOR_HOME))
        );

        router.route(ControllerEvent::Connected(Hand::Right));
        assert!(matches!(
            router.anchors().page_indicator,
            Anchor::Controller { hand: Hand::Right, .. }
        ));

        router.route(ControllerEvent::Disconnected(Hand::Left));
        assert_eq!(router.anchors().audio_button, Anchor::World(Pose::at(AUDIO_BUTTON_HOME)));
        assert!(matches!(
            router.anchors().page_indicator,
            Anchor::Controller { .. }
        ));
    }

    #[test]
    fn disconnect_forgets_held_buttons() {
        let mut router = XrInputRouter::new();
        router.route(press(Hand::Left, ControllerButton::Trigger, true));
        router.route(ControllerEvent::Disconnected(Hand::Left));
        assert_eq!(
            router.route(press(Hand::Left, ControllerButton::Trigger, true)),
            Some(GalleryAction::ToggleAudio)
        );
    }

    #[test]
    fn mounted_panel_follows_hand_pose() {
        let mut router = XrInputRouter::new();
        router.route(ControllerEvent::Connected(Hand::Right));
        router.route(ControllerEvent::Pose {
            hand: Hand::Right,
            pose: Pose::at(Vec3::new(1.0, 1.0, 1.0)),
        });
        let anchor = router.anchors().page_indicator;
        let origin = router.anchor_transform(&anchor).transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 1.07, 1.1)).length() < 1e-6);

        let home = router.anchor_transform(&Anchor::World(Pose::at(AUDIO_BUTTON_HOME)));
        assert_eq!(home.transform_point3(Vec3::ZERO), AUDIO_BUTTON_HOME);
    }
}
