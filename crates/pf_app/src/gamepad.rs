//! Controller backends feeding the XR input router.
//!
//! A desktop gamepad stands in for a pair of motion controllers: the left
//! stick and left trigger are the left hand, the right stick and the south
//! face button are the right hand.

#[cfg(feature = "gamepad")]
use crate::xr_input::ControllerButton;
use crate::xr_input::{ControllerEvent, Hand};

pub trait ControllerBackend {
    /// Drain everything that happened since the last poll.
    fn poll(&mut self) -> Vec<ControllerEvent>;
}

/// No controllers; pointer and keyboard only.
#[derive(Debug, Default)]
pub struct NullBackend;

impl ControllerBackend for NullBackend {
    fn poll(&mut self) -> Vec<ControllerEvent> {
        Vec::new()
    }
}

/// Thumbstick readings for one frame. Sticks are sampled every poll so a
/// held stick keeps rotating; the router applies the dead zone.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
pub fn held_sticks(left_x: f32, right_x: f32) -> Vec<ControllerEvent> {
    vec![
        ControllerEvent::Thumbstick {
            hand: Hand::Left,
            x: left_x,
            y: 0.0,
        },
        ControllerEvent::Thumbstick {
            hand: Hand::Right,
            x: right_x,
            y: 0.0,
        },
    ]
}

/// Connect events for pads that were plugged in before start-up, which the
/// device layer never announces.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
pub fn already_connected(pad_count: usize) -> Vec<ControllerEvent> {
    if pad_count == 0 {
        return Vec::new();
    }
    vec![
        ControllerEvent::Connected(Hand::Left),
        ControllerEvent::Connected(Hand::Right),
    ]
}

/// Backend-agnostic view of one gamepad event.
#[cfg(feature = "gamepad")]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadInput {
    Connected,
    Disconnected,
    Button(gilrs::Button, bool),
}

#[cfg(feature = "gamepad")]
pub fn map_input(input: PadInput) -> Vec<ControllerEvent> {
    use gilrs::Button;

    match input {
        PadInput::Connected => already_connected(1),
        PadInput::Disconnected => vec![
            ControllerEvent::Disconnected(Hand::Left),
            ControllerEvent::Disconnected(Hand::Right),
        ],
        // Analogue triggers only; the shoulder buttons would share the edge slot.
        PadInput::Button(Button::LeftTrigger2, pressed) => vec![ControllerEvent::Button {
            hand: Hand::Left,
            button: ControllerButton::Trigger,
            pressed,
        }],
        PadInput::Button(Button::RightTrigger2, pressed) => vec![ControllerEvent::Button {
            hand: Hand::Right,
            button: ControllerButton::Trigger,
            pressed,
        }],
        PadInput::Button(Button::South, pressed) => vec![ControllerEvent::Button {
            hand: Hand::Right,
            button: ControllerButton::Primary,
            pressed,
        }],
        _ => Vec::new(),
    }
}

#[cfg(feature = "gamepad")]
pub struct GilrsBackend {
    gilrs: gilrs::Gilrs,
    pending: Vec<ControllerEvent>,
}

#[cfg(feature = "gamepad")]
impl GilrsBackend {
    pub fn new() -> Result<Self, String> {
        let gilrs =
            gilrs::Gilrs::new().map_err(|e| format!("Failed to initialise gamepads: {e}"))?;
        let mut pad_count = 0;
        for (_id, pad) in gilrs.gamepads() {
            log::info!("Gamepad available: {}", pad.name());
            pad_count += 1;
        }
        Ok(Self {
            gilrs,
            pending: already_connected(pad_count),
        })
    }
}

#[cfg(feature = "gamepad")]
impl ControllerBackend for GilrsBackend {
    fn poll(&mut self) -> Vec<ControllerEvent> {
        use gilrs::{Axis, EventType};

        let mut out = std::mem::take(&mut self.pending);
        while let Some(gilrs::Event { event, .. }) = self.gilrs.next_event() {
            let input = match event {
                EventType::Connected => PadInput::Connected,
                EventType::Disconnected => PadInput::Disconnected,
                EventType::ButtonPressed(button, _) => PadInput::Button(button, true),
                EventType::ButtonReleased(button, _) => PadInput::Button(button, false),
                _ => continue,
            };
            out.extend(map_input(input));
        }
        // Stick state is current once the event queue is drained.
        if let Some((_id, pad)) = self.gilrs.gamepads().next() {
            out.extend(held_sticks(
                pad.value(Axis::LeftStickX),
                pad.value(Axis::RightStickX),
            ));
        }
        out
    }
}

/// Best available backend. A failing device layer is logged and replaced by
/// the null backend.
pub fn open_backend() -> Box<dyn ControllerBackend> {
    #[cfg(feature = "gamepad")]
    {
        match GilrsBackend::new() {
            Ok(backend) => return Box::new(backend),
            Err(e) => log::warn!("{e}; continuing with pointer and keyboard input"),
        }
    }
    Box::new(NullBackend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr_input::{Anchor, GalleryAction, XrInputRouter};

    #[test]
    fn null_backend_is_silent() {
        let mut backend = NullBackend;
        assert!(backend.poll().is_empty());
    }

    #[test]
    fn held_stick_keeps_rotating_every_frame() {
        let mut router = XrInputRouter::new();
        let mut yaw = 0.0;
        for _ in 0..3 {
            for event in held_sticks(0.5, 0.0) {
                if let Some(GalleryAction::Rotate(delta)) = router.route(event) {
                    yaw += delta;
                }
            }
            router.end_frame();
        }
        assert!((yaw + 0.075).abs() < 1e-6, "yaw {yaw}");
    }

    #[test]
    fn resting_sticks_do_not_rotate() {
        let mut router = XrInputRouter::new();
        for event in held_sticks(0.05, -0.02) {
            assert_eq!(router.route(event), None);
        }
    }

    #[test]
    fn pads_present_at_start_attach_the_panels() {
        assert!(already_connected(0).is_empty());

        let mut router = XrInputRouter::new();
        for event in already_connected(1) {
            router.route(event);
        }
        assert!(matches!(
            router.anchors().audio_button,
            Anchor::Controller {
                hand: Hand::Left,
                ..
            }
        ));
        assert!(matches!(
            router.anchors().page_indicator,
            Anchor::Controller {
                hand: Hand::Right,
                ..
            }
        ));
    }

    #[cfg(feature = "gamepad")]
    #[test]
    fn face_and_trigger_buttons() {
        use gilrs::Button;
        assert_eq!(
            map_input(PadInput::Button(Button::LeftTrigger2, true)),
            vec![ControllerEvent::Button {
                hand: Hand::Left,
                button: ControllerButton::Trigger,
                pressed: true
            }]
        );
        assert_eq!(
            map_input(PadInput::Button(Button::South, false)),
            vec![ControllerEvent::Button {
                hand: Hand::Right,
                button: ControllerButton::Primary,
                pressed: false
            }]
        );
        assert_eq!(map_input(PadInput::Connected).len(), 2);
    }

    #[cfg(feature = "gamepad")]
    #[test]
    fn shoulder_buttons_do_not_share_the_trigger() {
        use gilrs::Button;
        assert!(map_input(PadInput::Button(Button::LeftTrigger, true)).is_empty());
        assert!(map_input(PadInput::Button(Button::RightTrigger, true)).is_empty());
    }
}
