// src/engine/mod.rs

//! The orb animation engine.
//!
//! `OrbEngine` owns the figure, the drawing surface, and the per-target
//! animation schedule. An external driver calls [`OrbEngine::tick`] once
//! per display refresh; each tick advances every target's active animation
//! by the wall-clock delta, applies completion effects, promotes queued
//! animations, and then runs the draw pass, so a frame is always visually
//! self-consistent.
//!
//! Gestures are a closed [`Gesture`] enum dispatched through one match.
//! Each gesture reads the current pose and schedules one or more
//! [`Animation`]s; it never mutates pose directly. Deferred gestures are
//! queued as plain data and dispatched one per whole-figure idle frame.

use crate::animation::{AlertTrack, Animation, AnimationKind, IdlePulse, Notify};
use crate::color::Rgba;
use crate::geometry::{Figure, Square};
use crate::shader::SharedSurface;
use crate::surface::{Placement, Surface};

use anyhow::{bail, Result};
use log::{debug, trace, warn};
use std::collections::VecDeque;

#[cfg(test)]
mod tests;

/// How the draw pass produces pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Draw the figure's squares directly.
    #[default]
    None,
    /// Draw the attached shader surface, clipped to the figure silhouette.
    Figure,
}

/// Options for the alert gesture. Colors are 6-digit hex strings; a string
/// that fails to parse skips only the affected target.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertOptions {
    pub from: String,
    /// Defaults to `from` when absent.
    pub to: Option<String>,
    /// Duration of the first pulse; defaults to 2000 ms.
    pub duration_ms: Option<f64>,
    /// Number of pulses; defaults to 1.
    pub repetitions: Option<u32>,
}

/// The closed set of composite gestures.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Rotate45,
    Rotate45Center,
    Rotate45External { with_children: bool },
    Rotate45Middle { with_children: bool },
    Explode,
    Spin,
    Alert(AlertOptions),
    Reset,
}

/// A construction-time directive: either a gesture to run once at mount or
/// one of the two loading-flag controls.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Gesture(Gesture),
    /// Clear the loading flag.
    StopLoading,
    /// Clear the loading flag and restore the canonical pose.
    Idle,
}

impl Directive {
    /// Resolves a directive name. Unknown names return `None`; callers
    /// treat that as a no-op rather than an error.
    pub fn from_name(name: &str) -> Option<Directive> {
        let directive = match name {
            "rotate45" => Directive::Gesture(Gesture::Rotate45),
            "rotate45Center" => Directive::Gesture(Gesture::Rotate45Center),
            "rotate45External" => {
                Directive::Gesture(Gesture::Rotate45External { with_children: false })
            }
            "rotate45Middle" => {
                Directive::Gesture(Gesture::Rotate45Middle { with_children: false })
            }
            "explode" => Directive::Gesture(Gesture::Explode),
            "spin" => Directive::Gesture(Gesture::Spin),
            "reset" => Directive::Gesture(Gesture::Reset),
            "stopLoading" => Directive::StopLoading,
            "idle" => Directive::Idle,
            _ => return None,
        };
        Some(directive)
    }
}

/// Number of ghost passes drawn while a square carries motion blur.
const BLUR_STEPS: usize = 5;

/// The time-stepped animation engine and software render pipeline.
pub struct OrbEngine {
    figure: Figure,
    surface: Surface,
    mask: Surface,
    last_time: Option<f64>,
    /// At most one active animation per target.
    active: Vec<Option<Animation>>,
    /// FIFO of pending animations per target. Invariant: a queue is only
    /// non-empty while its target's active slot is occupied.
    queues: Vec<VecDeque<Animation>>,
    idle: Vec<IdlePulse>,
    /// Whole-figure deferred gestures, dispatched one per idle frame.
    pending: VecDeque<Gesture>,
    is_loading: bool,
    composite: CompositeMode,
    shader: Option<SharedSurface>,
}

impl OrbEngine {
    /// Creates an engine drawing `figure` into `surface`.
    ///
    /// Fails when the surface has no pixels; everything after construction
    /// is best-effort and degrades instead of erroring.
    pub fn new(figure: Figure, surface: Surface) -> Result<Self> {
        if surface.is_empty() {
            bail!(
                "drawing context unavailable: surface is {}x{}",
                surface.width(),
                surface.height()
            );
        }
        let targets = figure.squares.len();
        let mask = Surface::new(surface.width() as u32, surface.height() as u32);
        Ok(OrbEngine {
            figure,
            surface,
            mask,
            last_time: None,
            active: (0..targets).map(|_| None).collect(),
            queues: (0..targets).map(|_| VecDeque::new()).collect(),
            idle: (0..targets).map(IdlePulse::for_target).collect(),
            pending: VecDeque::new(),
            is_loading: false,
            composite: CompositeMode::None,
            shader: None,
        })
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// The drawing surface after the most recent tick.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Attaches (or detaches) an external shader surface and switches the
    /// composite mode. The engine only ever reads the shared surface.
    pub fn set_shader_source(&mut self, source: Option<SharedSurface>, mode: CompositeMode) {
        self.shader = source;
        self.composite = mode;
    }

    /// Sets or clears the loading flag.
    pub fn loading(&mut self, active: bool) {
        self.is_loading = active;
    }

    /// True while the target has an active or queued animation. Idle
    /// pulsing does not count.
    pub fn is_animating_square(&self, target: usize) -> bool {
        self.active.get(target).is_some_and(|slot| slot.is_some())
            || self.queues.get(target).is_some_and(|q| !q.is_empty())
    }

    /// True while any target is animating.
    pub fn is_animating(&self) -> bool {
        (0..self.figure.squares.len()).any(|i| self.is_animating_square(i))
    }

    /// Advances the clock to `timestamp_ms` and renders a frame. The first
    /// call latches the timestamp and renders with a zero delta.
    pub fn tick(&mut self, timestamp_ms: f64) {
        let delta = match self.last_time {
            Some(last) => timestamp_ms - last,
            None => 0.0,
        };
        self.last_time = Some(timestamp_ms);
        self.update(delta);
        self.draw();
    }

    /// Runs a gesture immediately through the fixed dispatch table.
    pub fn request(&mut self, gesture: Gesture) {
        trace!("gesture requested: {:?}", gesture);
        match gesture {
            Gesture::Rotate45 => self.play_rotation(&[0, 1, 2], 45.0, 1000.0),
            Gesture::Rotate45Center => self.play_rotation(&[2], 45.0, 1000.0),
            Gesture::Rotate45External { with_children } => {
                if with_children {
                    self.play_rotation(&[0, 1, 2], 45.0, 1000.0);
                } else {
                    self.play_rotation(&[0], 45.0, 1000.0);
                }
            }
            Gesture::Rotate45Middle { with_children } => {
                if with_children {
                    self.play_rotation(&[1, 2], 45.0, 1000.0);
                } else {
                    self.play_rotation(&[1], 45.0, 1000.0);
                }
            }
            Gesture::Explode => self.explode(None),
            Gesture::Spin => self.spin(),
            Gesture::Alert(options) => self.alert(
                &options.from,
                options.to.as_deref(),
                options.duration_ms,
                options.repetitions,
            ),
            Gesture::Reset => self.reset(),
        }
    }

    /// Defers a gesture until the whole figure is idle. Deferred gestures
    /// run in FIFO order, one per idle frame.
    pub fn queue_gesture(&mut self, gesture: Gesture) {
        self.pending.push_back(gesture);
    }

    /// Applies a construction-time directive.
    pub fn apply_directive(&mut self, directive: Directive) {
        match directive {
            Directive::Gesture(gesture) => self.request(gesture),
            Directive::StopLoading => self.loading(false),
            Directive::Idle => {
                self.loading(false);
                self.reset();
            }
        }
    }

    // --- Choreography ---

    /// Three simultaneous rotations of increasing sweep, outer to center.
    pub fn spin(&mut self) {
        self.play_rotation(&[0], 180.0, 2000.0);
        self.play_rotation(&[1], 360.0, 2000.0);
        self.play_rotation(&[2], 720.0, 2000.0);
    }

    /// Staggered scale pulses, outer first, center last and sharpest. A
    /// supplied callback fires after the center pulse completes, composing
    /// with any callback already attached there.
    pub fn explode(&mut self, mut on_complete: Option<Notify>) {
        const PULSES: [(usize, f64, f64, f64); 3] = [
            (0, 1.2, 1200.0, 0.0),
            (1, 1.3, 900.0, 100.0),
            (2, 1.5, 600.0, 200.0),
        ];
        for (index, factor, duration, delay) in PULSES {
            let Some(square) = self.figure.squares.get(index) else {
                continue;
            };
            let mut animation = Animation::new(
                "scale",
                AnimationKind::ScalePulse {
                    start_scale: square.scale,
                    peak_scale: square.initial_scale * factor,
                },
                duration,
            )
            .with_delay(delay);
            if index == PULSES.len() - 1 {
                if let Some(callback) = on_complete.take() {
                    animation.chain_notify(callback);
                }
            }
            self.schedule_or_queue(index, animation);
        }
    }

    /// Pulsing color-and-scale alert. Colors are 6-digit hex; per target,
    /// the blend endpoint moves from `from` (outer) to `to` (center), the
    /// start is staggered, and each repetition is 300 ms shorter than the
    /// previous one, floored at 500 ms.
    pub fn alert(
        &mut self,
        from: &str,
        to: Option<&str>,
        duration_ms: Option<f64>,
        repetitions: Option<u32>,
    ) {
        let target_hex = to.unwrap_or(from);
        let base_duration = duration_ms.unwrap_or(2000.0);
        let loops = repetitions.unwrap_or(1);

        for index in 0..self.figure.squares.len().min(3) {
            let (from_rgb, to_rgb) = match (Rgba::from_hex(from), Rgba::from_hex(target_hex)) {
                (Some(f), Some(t)) => (f, t),
                _ => {
                    warn!(
                        "alert: unparseable color ({:?} -> {:?}); skipping target {}",
                        from, target_hex, index
                    );
                    continue;
                }
            };
            let square = &self.figure.squares[index];
            let endpoint = from_rgb.lerp(to_rgb, index as f64 / 2.0);
            let track = AlertTrack {
                start_scale: square.scale,
                peak_scale: square.initial_scale * (1.1 + index as f64 * 0.05),
                endpoint,
                base_duration,
                repetitions: loops,
                color_lag: index as f64 * 0.3,
                paint_fill: !square.original_color.is_transparent(),
            };
            let total = track.total_duration();
            let animation = Animation::new("alert", AnimationKind::Alert(track), total)
                .with_delay(index as f64 * (base_duration * 0.1));
            self.schedule_or_queue(index, animation);
        }
    }

    /// Restores the canonical pose: every square whose 45-degree latch is
    /// set gets one compensating rotation back; idle pulsing restarts from
    /// phase zero. A no-op (beyond the idle restart) when nothing is
    /// rotated, so repeated resets schedule nothing new.
    pub fn reset(&mut self) {
        let rotated: Vec<usize> = self
            .figure
            .squares
            .iter()
            .enumerate()
            .filter(|(_, square)| square.is_rotated)
            .map(|(index, _)| index)
            .collect();
        if !rotated.is_empty() {
            debug!("reset: compensating rotation on targets {:?}", rotated);
            self.play_rotation(&rotated, -45.0, 1000.0);
        }
        for pulse in &mut self.idle {
            pulse.restart();
        }
    }

    // --- Scheduling ---

    /// Schedules one eased rotation per target, capturing each square's
    /// pose at scheduling time.
    fn play_rotation(&mut self, targets: &[usize], angle: f64, duration_ms: f64) {
        for &index in targets {
            let Some(square) = self.figure.squares.get(index) else {
                warn!("rotation target {} out of range; skipping", index);
                continue;
            };
            let animation = Animation::new(
                "rotate",
                AnimationKind::Rotate {
                    start: square.rotation,
                    angle,
                },
                duration_ms,
            );
            self.schedule_or_queue(index, animation);
        }
    }

    /// Activates `animation` on an idle target, or appends it to the
    /// target's queue while something is already running there.
    fn schedule_or_queue(&mut self, target: usize, animation: Animation) {
        if self.active[target].is_some() {
            self.queues[target].push_back(animation);
        } else {
            self.active[target] = Some(animation);
        }
    }

    /// Advances all per-target schedules by `delta_ms`, then either
    /// dispatches one deferred gesture or lets the idle layer breathe.
    fn update(&mut self, delta_ms: f64) {
        let mut all_idle = true;

        for index in 0..self.active.len() {
            let finished_now = match self.active[index].as_mut() {
                Some(animation) => {
                    all_idle = false;
                    animation.elapsed += delta_ms;
                    animation.elapsed >= animation.duration
                }
                None => continue,
            };

            if finished_now {
                if let Some(mut animation) = self.active[index].take() {
                    let square = &mut self.figure.squares[index];
                    // Clamp to the exact end state before the one-time
                    // completion effects run.
                    animation.apply(square, animation.duration);
                    animation.complete(square);
                    self.active[index] = self.queues[index].pop_front();
                }
            } else if let Some(animation) = self.active[index].as_ref() {
                let at = animation.elapsed;
                animation.apply(&mut self.figure.squares[index], at);
            }
        }

        // Idle pulsing and deferred gestures both wait for the entire
        // figure: one deferred gesture per idle frame, and the idle layer
        // only advances when nothing at all is queued.
        if all_idle {
            if let Some(gesture) = self.pending.pop_front() {
                debug!("dispatching deferred gesture: {:?}", gesture);
                self.request(gesture);
            } else {
                for (index, pulse) in self.idle.iter_mut().enumerate() {
                    pulse.advance(&mut self.figure.squares[index], delta_ms);
                }
            }
        }
    }

    // --- Render pipeline ---

    fn draw(&mut self) {
        self.surface.clear();
        if self.composite == CompositeMode::Figure {
            if let Some(handle) = self.shader.clone() {
                let shader = handle.borrow();
                if !shader.is_empty() {
                    self.draw_shader_masked(&shader);
                    return;
                }
                trace!("shader surface not ready; drawing figure directly this frame");
            }
        }
        self.draw_figure();
    }

    fn figure_center(&self) -> (f64, f64) {
        (
            self.surface.width() as f64 / 2.0 + self.figure.offset_x,
            self.surface.height() as f64 / 2.0 + self.figure.offset_y,
        )
    }

    /// Direct vector drawing: squares back to front under their own local
    /// transforms.
    fn draw_figure(&mut self) {
        let (cx, cy) = self.figure_center();
        for square in &self.figure.squares {
            draw_square(&mut self.surface, square, cx, cy);
        }
    }

    /// Shader compositing: blit the shader full-frame, then keep only the
    /// pixels under the figure's current silhouette.
    ///
    /// The mask is rebuilt every frame from the live pose, so shader and
    /// figure stay pixel-aligned mid-animation. Strokes are centered on the
    /// square edge, so a bordered square's visible ring spans
    /// `(size - border_width) / 2` to `(size + border_width) / 2`; the mask
    /// uses exactly those bounds, and the filled center square is covered
    /// out to its stroke's outer edge.
    fn draw_shader_masked(&mut self, shader: &Surface) {
        let (cx, cy) = self.figure_center();
        self.mask.clear();

        let count = self.figure.squares.len();
        for (index, square) in self.figure.squares.iter().enumerate() {
            let placement = Placement {
                center_x: cx,
                center_y: cy,
                rotation_deg: square.display_rotation(),
                scale: square.scale,
            };
            // Same arithmetic as the stroke path in `paint_square`, so the
            // mask bounds are bitwise identical to the stroke bounds.
            let half = square.border_width / 2.0;
            if index + 1 == count {
                self.mask
                    .paint_square_band(&placement, 0.0, square.size / 2.0 + half, Rgba::WHITE);
            } else if square.border_width > 0.0 {
                let inner = (square.size / 2.0 - half).max(0.0);
                self.mask
                    .paint_square_band(&placement, inner, square.size / 2.0 + half, Rgba::WHITE);
            }
        }

        self.surface.blit_scaled(shader);
        self.surface.mask_destination_in(&self.mask);
    }
}

/// Draws one square: fill then centered stroke, or the five-pass ghost
/// trail while the square carries motion blur.
fn draw_square(surface: &mut Surface, square: &Square, cx: f64, cy: f64) {
    let placement = Placement {
        center_x: cx,
        center_y: cy,
        rotation_deg: square.display_rotation(),
        scale: square.scale,
    };

    if square.motion_blur > 0.0 {
        let alpha_step = 0.3 / BLUR_STEPS as f64;
        for step in 0..BLUR_STEPS {
            let ghost = Placement {
                rotation_deg: placement.rotation_deg - square.motion_blur * 5.0 * step as f64,
                ..placement
            };
            let alpha = alpha_step * (BLUR_STEPS - step) as f64;
            paint_square(surface, square, &ghost, alpha);
        }
    } else {
        paint_square(surface, square, &placement, 1.0);
    }
}

fn paint_square(surface: &mut Surface, square: &Square, placement: &Placement, alpha: f64) {
    if !square.color.is_transparent() {
        surface.paint_square_band(
            placement,
            0.0,
            square.size / 2.0,
            square.color.scale_alpha(alpha),
        );
    }
    if square.border_width > 0.0 && !square.border_color.is_transparent() {
        let half = square.border_width / 2.0;
        surface.paint_square_band(
            placement,
            square.size / 2.0 - half,
            square.size / 2.0 + half,
            square.border_color.scale_alpha(alpha),
        );
    }
}
