//! Frame timing for the scene loop.
//!
//! `TimeState` turns wall-clock frames into fixed simulation steps (60 Hz by
//! default). Motion, deformation envelopes and gallery tweens advance only
//! inside those steps, so the scenes behave the same regardless of the
//! display refresh rate.
//!
//! `SimClock` is the monotonically increasing accumulator that feeds the
//! wind oscillation. It is advanced by one tick per fixed step and handed to
//! the integrator explicitly.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_accumulator: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Length of one fixed step in whole microseconds.
    pub fn fixed_dt_us(&self) -> u64 {
        (self.fixed_dt * 1_000_000.0).round() as u64
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt);
    }

    /// Feed a measured frame delta into the accumulator.
    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt.max(0.0);

        // A stalled frame (window drag, debugger) must not replay seconds of
        // simulation in one burst.
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulation time driving the wind oscillation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    elapsed: f32,
    tick: f32,
}

impl SimClock {
    pub const DEFAULT_TICK: f32 = 0.01;

    pub fn new(tick: f32) -> Self {
        Self { elapsed: 0.0, tick }
    }

    /// Advance by one tick and return the new time.
    pub fn tick(&mut self) -> f32 {
        self.elapsed += self.tick;
        self.elapsed
    }

    pub fn now(&self) -> f32 {
        self.elapsed
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK)
    }
}
