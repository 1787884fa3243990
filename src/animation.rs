// src/animation.rs

//! The animation primitive and its interpreter.
//!
//! An [`Animation`] is a data record: a closed [`AnimationKind`] carrying
//! the pose captured at scheduling time, a duration, and a signed elapsed
//! time (negative values encode a pre-delay during which the animation is
//! inert). A single interpreter advances any kind against its target
//! [`Square`], and a matching completion step applies the one-time side
//! effects (restoring saved pose, toggling the rotation latch). The only
//! closure an animation may carry is an externally supplied completion
//! callback; engine state is never captured.
//!
//! Idle motion is deliberately not an `Animation`: the perpetual low
//! amplitude pulse has no duration and no completion, so it gets its own
//! small type, [`IdlePulse`].

use crate::color::Rgba;
use crate::easing;
use crate::geometry::Square;
use std::f64::consts::PI;

/// Externally supplied completion callback.
pub type Notify = Box<dyn FnOnce()>;

/// Per-target data for one alert pulse sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTrack {
    /// Scale at scheduling time; the rise half starts from here.
    pub start_scale: f64,
    /// Peak scale of the pulse.
    pub peak_scale: f64,
    /// Color endpoint for this target: the border (and fill, when painted)
    /// eases from white toward this color and back.
    pub endpoint: Rgba,
    /// Duration of the first repetition; each later repetition is 300 ms
    /// shorter, floored at 500 ms.
    pub base_duration: f64,
    pub repetitions: u32,
    /// Per-target lag before the color starts to follow the scale, as a
    /// fraction of the rise half.
    pub color_lag: f64,
    /// Whether the fill color is animated too. Only squares whose original
    /// fill is not fully transparent take part.
    pub paint_fill: bool,
}

impl AlertTrack {
    /// Duration of repetition `index`.
    fn repetition_duration(&self, index: u32) -> f64 {
        (self.base_duration - index as f64 * 300.0).max(500.0)
    }

    /// Total duration across all repetitions.
    pub fn total_duration(&self) -> f64 {
        (0..self.repetitions).map(|i| self.repetition_duration(i)).sum()
    }

    /// Locates `at` within the repetition plan, returning the repetition's
    /// local time and duration. `None` once the plan is exhausted.
    fn locate(&self, at: f64) -> Option<(f64, f64)> {
        let mut remaining = at;
        for i in 0..self.repetitions {
            let duration = self.repetition_duration(i);
            if remaining < duration {
                return Some((remaining, duration));
            }
            remaining -= duration;
        }
        None
    }
}

/// The closed set of animation behaviors.
///
/// Each variant carries only data; [`Animation::apply`] interprets it.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKind {
    /// Eased rotation from `start` by `angle` degrees. Angles of 360 or
    /// more also drive the motion blur hint, peaking mid-rotation.
    Rotate { start: f64, angle: f64 },
    /// Scale pulse that rises from `start_scale` to `peak_scale` and falls
    /// back to the square's initial scale, each half sine-eased.
    ScalePulse { start_scale: f64, peak_scale: f64 },
    /// Repeated scale-and-color pulse; see [`AlertTrack`].
    Alert(AlertTrack),
}

/// A unit of timed mutation over one target square.
pub struct Animation {
    pub name: &'static str,
    pub kind: AnimationKind,
    /// Total duration in milliseconds.
    pub duration: f64,
    /// Elapsed milliseconds; starts negative when the animation has a
    /// pre-delay and the update is a no-op until it crosses zero.
    pub elapsed: f64,
    /// Latched on completion; a finished animation is never advanced again.
    pub finished: bool,
    notify: Option<Notify>,
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("finished", &self.finished)
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

impl Animation {
    pub fn new(name: &'static str, kind: AnimationKind, duration_ms: f64) -> Self {
        Animation {
            name,
            kind,
            duration: duration_ms,
            elapsed: 0.0,
            finished: false,
            notify: None,
        }
    }

    /// Starts the animation `delay_ms` before its own time zero.
    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.elapsed = -delay_ms;
        self
    }

    /// Appends an external completion callback, composing with (never
    /// replacing) any callback already attached.
    pub fn chain_notify(&mut self, next: Notify) {
        self.notify = match self.notify.take() {
            Some(prev) => Some(Box::new(move || {
                prev();
                next();
            })),
            None => Some(next),
        };
    }

    /// Advances the target square to the pose at time `at` (milliseconds
    /// from the animation's own time zero). Inert while `at` is negative.
    pub fn apply(&self, square: &mut Square, at: f64) {
        if at < 0.0 {
            return;
        }
        match &self.kind {
            AnimationKind::Rotate { start, angle } => {
                let progress = at / self.duration;
                let eased = easing::ease_in_out_cubic(progress);
                if *angle >= 360.0 {
                    square.motion_blur = (progress * PI).sin() * 0.3;
                }
                square.rotation = start + eased * angle;
            }
            AnimationKind::ScalePulse { start_scale, peak_scale } => {
                let progress = at / self.duration;
                if progress < 0.5 {
                    let rise = easing::sine_rise(progress * 2.0);
                    square.scale = start_scale + rise * (peak_scale - start_scale);
                } else {
                    let fall = easing::sine_fall((progress - 0.5) * 2.0);
                    square.scale = square.initial_scale + fall * (peak_scale - square.initial_scale);
                }
            }
            AnimationKind::Alert(track) => {
                apply_alert(track, square, at);
            }
        }
    }

    /// Applies the one-time completion side effects and fires the external
    /// callback, if any. Call exactly once, after a final clamped `apply`.
    pub fn complete(&mut self, square: &mut Square) {
        match &self.kind {
            AnimationKind::Rotate { start, angle } => {
                square.rotation = start + angle;
                square.accumulated_rotation =
                    (square.accumulated_rotation + angle).rem_euclid(360.0);
                if angle.abs() == 45.0 {
                    square.is_rotated = !square.is_rotated;
                }
                square.motion_blur = 0.0;
            }
            AnimationKind::ScalePulse { .. } => {
                square.scale = square.initial_scale;
            }
            AnimationKind::Alert(_) => {
                square.scale = square.initial_scale;
                square.border_color = square.original_border_color;
                square.color = square.original_color;
            }
        }
        self.finished = true;
        if let Some(notify) = self.notify.take() {
            notify();
        }
    }
}

/// Fraction of the rise (or fall) half over which a target's color catches
/// up once its lag has passed.
const ALERT_COLOR_WINDOW: f64 = 0.3;

fn apply_alert(track: &AlertTrack, square: &mut Square, at: f64) {
    let Some((time_in_rep, rep_duration)) = track.locate(at) else {
        return;
    };
    let progress = time_in_rep / rep_duration;

    if progress <= 0.5 {
        let rise_progress = progress * 2.0;
        let rise = easing::sine_rise(rise_progress);
        square.scale = track.start_scale + (track.peak_scale - track.start_scale) * rise;

        if rise_progress >= track.color_lag {
            let local = ((rise_progress - track.color_lag) / ALERT_COLOR_WINDOW).min(1.0);
            let eased = easing::sine_rise(local);
            paint_alert_color(track, square, eased);
        }
    } else {
        let fall_progress = (progress - 0.5) * 2.0;
        if fall_progress >= track.color_lag {
            let local = ((fall_progress - track.color_lag) / ALERT_COLOR_WINDOW).min(1.0);
            let eased = easing::sine_fall(local);
            paint_alert_color(track, square, eased);
            square.scale =
                square.initial_scale + (track.peak_scale - square.initial_scale) * eased;
        }
    }
}

fn paint_alert_color(track: &AlertTrack, square: &mut Square, eased: f64) {
    let color = Rgba::WHITE.lerp(track.endpoint, eased);
    square.border_color = color;
    if track.paint_fill {
        square.color = color;
    }
}

/// Perpetual low-amplitude scale pulse, one per target.
///
/// Never finishes and never enters the scheduler; the engine advances it
/// only in frames where the whole figure is idle.
#[derive(Debug, Clone, PartialEq)]
pub struct IdlePulse {
    pub elapsed: f64,
    amplitude: f64,
    speed: f64,
}

impl IdlePulse {
    /// Pulse parameters grow slightly with the target index, so the three
    /// squares breathe out of phase.
    pub fn for_target(index: usize) -> Self {
        IdlePulse {
            elapsed: 0.0,
            amplitude: 0.05 + index as f64 * 0.01,
            speed: 0.001 + index as f64 * 0.0005,
        }
    }

    pub fn advance(&mut self, square: &mut Square, delta_ms: f64) {
        self.elapsed += delta_ms;
        let t = self.elapsed * self.speed;
        square.scale = square.initial_scale + t.sin() * self.amplitude;
    }

    /// Restarts the pulse phase; used by `reset`.
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
    }
}
