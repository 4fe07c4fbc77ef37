//! Keyframed scalar animation with easing, driven by fixed steps.
//!
//! All timing uses integer microseconds (`u64`) so envelopes advance
//! identically on every platform: the same sequence of steps always lands on
//! the same keys. Easing is applied to the gradient *within* each key
//! segment, so every key value is hit exactly regardless of the curve.

use serde::Deserialize;

/// Easing curve applied to a normalized gradient in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    CubicIn,
    CubicOut,
}

impl Easing {
    pub fn apply(self, gradient: f32) -> f32 {
        let g = gradient.clamp(0.0, 1.0);
        match self {
            Self::Linear => g,
            Self::CubicIn => g * g * g,
            Self::CubicOut => {
                let inv = 1.0 - g;
                1.0 - inv * inv * inv
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time_us: u64,
    pub value: f32,
}

impl Keyframe {
    pub const fn new(time_us: u64, value: f32) -> Self {
        Self { time_us, value }
    }
}

/// An ordered set of keys starting at t=0, sampled with one easing curve.
#[derive(Debug, Clone)]
pub struct KeyframeTrack {
    keys: Vec<Keyframe>,
    easing: Easing,
}

impl KeyframeTrack {
    pub fn new(keys: Vec<Keyframe>, easing: Easing) -> Result<Self, String> {
        let Some(first) = keys.first() else {
            return Err("Keyframe track has no keys".to_string());
        };
        if first.time_us != 0 {
            return Err(format!(
                "Keyframe track must start at t=0, first key is at {}us",
                first.time_us
            ));
        }
        for pair in keys.windows(2) {
            if pair[1].time_us <= pair[0].time_us {
                return Err(format!(
                    "Keyframe times must strictly increase ({}us then {}us)",
                    pair[0].time_us, pair[1].time_us
                ));
            }
        }
        Ok(Self { keys, easing })
    }

    pub fn duration_us(&self) -> u64 {
        self.keys.last().map_or(0, |k| k.time_us)
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Value at `t_us`; clamps to the last key past the end.
    pub fn sample(&self, t_us: u64) -> f32 {
        let Some(segment) = self.keys.windows(2).find(|pair| t_us <= pair[1].time_us) else {
            return self.keys.last().map_or(0.0, |k| k.value);
        };
        let (start, end) = (segment[0], segment[1]);
        if t_us <= start.time_us {
            return start.value;
        }
        let span = (end.time_us - start.time_us) as f32;
        let gradient = (t_us - start.time_us) as f32 / span;
        start.value + (end.value - start.value) * self.easing.apply(gradient)
    }
}

/// Playback cursor over a `KeyframeTrack`.
#[derive(Debug, Clone, Default)]
pub struct TrackPlayback {
    pub elapsed_us: u64,
    pub finished: bool,
}

impl TrackPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt_us` and return the sampled value.
    pub fn tick(&mut self, dt_us: u64, track: &KeyframeTrack) -> f32 {
        if !self.finished {
            self.elapsed_us = (self.elapsed_us + dt_us).min(track.duration_us());
            self.finished = self.elapsed_us >= track.duration_us();
        }
        track.sample(self.elapsed_us)
    }
}

/// Two-key animation between `from` and `to`.
#[derive(Debug, Clone)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration_us: u64,
    pub easing: Easing,
    elapsed_us: u64,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration_us: u64, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration_us,
            easing,
            elapsed_us: 0,
        }
    }

    pub fn tick(&mut self, dt_us: u64) -> f32 {
        self.elapsed_us = (self.elapsed_us + dt_us).min(self.duration_us);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.duration_us == 0 {
            return self.to;
        }
        let gradient = self.elapsed_us as f32 / self.duration_us as f32;
        self.from + (self.to - self.from) * self.easing.apply(gradient)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_us >= self.duration_us
    }
}
