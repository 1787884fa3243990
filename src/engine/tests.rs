// src/engine/tests.rs

use super::*;
use crate::animation::{Animation, AnimationKind, Notify};
use crate::color::Rgba;
use crate::geometry::Figure;
use crate::surface::Surface;

use std::cell::RefCell;
use std::rc::Rc;
use test_log::test;

const BASE: Rgba = Rgba::new(255, 255, 255, 230);

fn test_engine() -> OrbEngine {
    let figure = Figure::orb(64, 64, BASE);
    let surface = Surface::new(64, 64);
    OrbEngine::new(figure, surface).expect("surface is non-empty")
}

fn filled_surface(width: u32, height: u32, color: Rgba) -> Surface {
    let mut surface = Surface::new(width, height);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            surface.set_pixel(x, y, color);
        }
    }
    surface
}

/// Records the order in which completion callbacks fire.
fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Notify) {
    let order = Rc::new(RefCell::new(Vec::new()));
    let handle = Rc::clone(&order);
    let make = move |label: &'static str| -> Notify {
        let sink = Rc::clone(&handle);
        Box::new(move || sink.borrow_mut().push(label))
    };
    (order, make)
}

#[test]
fn construction_fails_on_zero_sized_surface() {
    let figure = Figure::orb(64, 64, BASE);
    assert!(OrbEngine::new(figure, Surface::new(0, 64)).is_err());
}

// --- Scheduler ---

#[test]
fn second_animation_queues_behind_the_active_one() {
    let mut engine = test_engine();
    let (order, notify) = recorder();

    let mut first = Animation::new(
        "rotate",
        AnimationKind::Rotate { start: 45.0, angle: 45.0 },
        100.0,
    );
    first.chain_notify(notify("first"));
    let mut second = Animation::new(
        "rotate",
        AnimationKind::Rotate { start: 45.0, angle: 45.0 },
        100.0,
    );
    second.chain_notify(notify("second"));

    engine.schedule_or_queue(2, first);
    engine.schedule_or_queue(2, second);

    // One active, one queued; never two active.
    assert!(engine.active[2].is_some());
    assert_eq!(engine.queues[2].len(), 1);

    engine.tick(0.0);
    assert!(order.borrow().is_empty());

    engine.tick(100.0);
    // First completed, second was promoted and is now the single active.
    assert_eq!(*order.borrow(), vec!["first"]);
    assert!(engine.active[2].is_some());
    assert!(engine.queues[2].is_empty());

    engine.tick(200.0);
    assert_eq!(*order.borrow(), vec!["first", "second"]);
    assert!(engine.active[2].is_none());
}

#[test]
fn scheduling_on_an_idle_target_activates_immediately() {
    let mut engine = test_engine();
    let animation = Animation::new(
        "rotate",
        AnimationKind::Rotate { start: 45.0, angle: 45.0 },
        100.0,
    );
    engine.schedule_or_queue(0, animation);
    assert!(engine.active[0].is_some());
    assert!(engine.queues[0].is_empty());
    assert!(engine.is_animating_square(0));
    assert!(!engine.is_animating_square(1));
}

// --- Reset ---

#[test]
fn reset_on_canonical_pose_schedules_nothing() {
    let mut engine = test_engine();
    engine.reset();
    assert!(!engine.is_animating());
}

#[test]
fn reset_after_rotate45_restores_the_original_rotation() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.request(Gesture::Rotate45);
    engine.tick(1000.0);

    for square in &engine.figure.squares {
        assert_eq!(square.rotation, 90.0);
        assert!(square.is_rotated);
    }

    engine.reset();
    // Exactly one compensating animation per rotated target.
    for index in 0..3 {
        assert!(engine.active[index].is_some());
        assert!(engine.queues[index].is_empty());
    }

    engine.tick(2000.0);
    for square in &engine.figure.squares {
        assert_eq!(square.rotation, square.initial_rotation);
        assert_eq!(square.accumulated_rotation, 0.0);
        assert!(!square.is_rotated);
    }
    assert!(!engine.is_animating());
}

#[test]
fn reset_only_touches_rotated_targets() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.request(Gesture::Rotate45Center);
    engine.tick(1000.0);
    assert!(engine.figure.squares[2].is_rotated);

    engine.reset();
    assert!(engine.active[0].is_none());
    assert!(engine.active[1].is_none());
    assert!(engine.active[2].is_some());
}

// --- Idle layer ---

#[test]
fn idle_pulses_advance_only_when_the_whole_figure_is_idle() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.tick(100.0);
    // Fully idle: pulses advanced.
    assert!(engine.idle.iter().all(|p| p.elapsed == 100.0));

    engine.request(Gesture::Rotate45Center);
    engine.tick(200.0);
    engine.tick(300.0);
    // One target animating suppresses idle for every target.
    assert!(engine.idle.iter().all(|p| p.elapsed == 100.0));
}

#[test]
fn a_pending_gesture_suppresses_idle_for_that_frame() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.queue_gesture(Gesture::Rotate45Center);
    engine.tick(100.0);
    // The deferred gesture was dispatched instead of idling.
    assert!(engine.is_animating_square(2));
    assert!(engine.idle.iter().all(|p| p.elapsed == 0.0));
}

#[test]
fn deferred_gestures_run_after_the_current_one_finishes() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.request(Gesture::Rotate45Center);
    engine.queue_gesture(Gesture::Explode);

    engine.tick(500.0);
    assert!(engine.pending.len() == 1);

    engine.tick(1000.0);
    // Rotation completed this frame; explode dispatches on the next idle
    // frame, not in the same one.
    assert!(engine.pending.len() == 1);

    engine.tick(1016.0);
    assert!(engine.pending.is_empty());
    assert!(engine.is_animating_square(0));
    assert!(engine.is_animating_square(1));
    assert!(engine.is_animating_square(2));
}

// --- Explode ---

#[test]
fn explode_timing_matches_the_documented_triples() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.explode(None);
    engine.tick(250.0);

    // Target 0 (1.2x over 1200 ms, no delay): mid-rise, strictly between
    // initial and peak.
    let outer = &engine.figure.squares[0];
    assert!(outer.scale > 1.0 && outer.scale < 1.2, "scale = {}", outer.scale);

    // Target 2 (200 ms delay, 600 ms duration): 50 ms into its rise.
    let center = &engine.figure.squares[2];
    assert!(center.scale > 1.0, "scale = {}", center.scale);
    assert!(center.scale < 1.06, "scale = {}", center.scale);
}

#[test]
fn explode_restores_scales_when_finished() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.explode(None);
    engine.tick(1200.0);
    for square in &engine.figure.squares {
        assert_eq!(square.scale, square.initial_scale);
    }
    assert!(!engine.is_animating());
}

#[test]
fn explode_callback_fires_after_the_center_pulse() {
    let mut engine = test_engine();
    let (order, notify) = recorder();
    engine.tick(0.0);
    engine.explode(Some(notify("done")));

    // Center pulse spans 200 ms delay + 600 ms duration.
    engine.tick(799.0);
    assert!(order.borrow().is_empty());
    engine.tick(800.0);
    assert_eq!(*order.borrow(), vec!["done"]);
    // The outer pulse is still running.
    assert!(engine.is_animating_square(0));
}

#[test]
fn queued_explode_callbacks_fire_in_order() {
    let mut engine = test_engine();
    let (order, notify) = recorder();
    engine.tick(0.0);
    engine.explode(Some(notify("first")));
    engine.explode(Some(notify("second")));

    // Second explode queued behind the first on every target.
    assert_eq!(engine.queues[2].len(), 1);

    engine.tick(800.0);
    assert_eq!(*order.borrow(), vec!["first"]);
    // The queued pulse starts its own 200 ms delay only once promoted.
    engine.tick(1600.0);
    assert_eq!(*order.borrow(), vec!["first", "second"]);
}

// --- Spin ---

#[test]
fn spin_blurs_only_full_rotations() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.spin();
    engine.tick(1000.0);

    // 180-degree sweep stays crisp; 360 and 720 blur, peaking mid-spin.
    assert_eq!(engine.figure.squares[0].motion_blur, 0.0);
    assert!((engine.figure.squares[1].motion_blur - 0.3).abs() < 1e-9);
    assert!((engine.figure.squares[2].motion_blur - 0.3).abs() < 1e-9);

    engine.tick(2000.0);
    for square in &engine.figure.squares {
        assert_eq!(square.motion_blur, 0.0);
    }
    assert_eq!(engine.figure.squares[0].rotation, 45.0 + 180.0);
    assert_eq!(engine.figure.squares[1].rotation, 45.0 + 360.0);
    assert_eq!(engine.figure.squares[2].rotation, 45.0 + 720.0);
}

// --- Alert ---

#[test]
fn alert_endpoints_hit_source_and_target_colors() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.alert("#ff0000", Some("#0000ff"), None, None);

    // Outer target peaks at half its 2000 ms pulse: pure source color.
    engine.tick(1000.0);
    assert_eq!(engine.figure.squares[0].border_color, Rgba::opaque(255, 0, 0));

    // Center target is staggered by 400 ms; at its own peak it shows the
    // exact target color.
    engine.tick(1400.0);
    assert_eq!(engine.figure.squares[2].border_color, Rgba::opaque(0, 0, 255));
}

#[test]
fn alert_skips_targets_on_unparseable_colors() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.alert("not-a-color", None, None, None);
    assert!(!engine.is_animating());
}

#[test]
fn alert_only_paints_fills_that_were_not_transparent() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.alert("#ff0000", None, None, None);
    engine.tick(1000.0);

    // Outer square's fill is transparent and stays untouched; the filled
    // center square follows the alert color.
    let outer = &engine.figure.squares[0];
    assert!(outer.color.is_transparent());
    assert_ne!(outer.border_color, outer.original_border_color);

    engine.tick(1400.0);
    let center = &engine.figure.squares[2];
    assert_eq!(center.color, center.border_color);
}

#[test]
fn alert_restores_everything_on_completion() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.alert("#ff0000", None, Some(800.0), Some(2));
    // Two repetitions: 800 + 500 (floored), plus the center's 160 ms
    // stagger; run well past the end.
    engine.tick(2000.0);
    for square in &engine.figure.squares {
        assert_eq!(square.border_color, square.original_border_color);
        assert_eq!(square.color, square.original_color);
        assert_eq!(square.scale, square.initial_scale);
    }
    assert!(!engine.is_animating());
}

// --- Directives ---

#[test]
fn directive_names_resolve_to_the_closed_set() {
    assert_eq!(
        Directive::from_name("rotate45"),
        Some(Directive::Gesture(Gesture::Rotate45))
    );
    assert_eq!(
        Directive::from_name("rotate45External"),
        Some(Directive::Gesture(Gesture::Rotate45External { with_children: false }))
    );
    assert_eq!(Directive::from_name("stopLoading"), Some(Directive::StopLoading));
    assert_eq!(Directive::from_name("idle"), Some(Directive::Idle));
    assert_eq!(Directive::from_name("explode"), Some(Directive::Gesture(Gesture::Explode)));
    assert_eq!(Directive::from_name("wiggle"), None);
    assert_eq!(Directive::from_name(""), None);
}

#[test]
fn loading_directives_drive_the_flag() {
    let mut engine = test_engine();
    engine.loading(true);
    assert!(engine.is_loading());

    engine.apply_directive(Directive::StopLoading);
    assert!(!engine.is_loading());

    engine.loading(true);
    engine.apply_directive(Directive::Idle);
    assert!(!engine.is_loading());
}

// --- Render pipeline ---

#[test]
fn composited_output_stays_inside_the_vector_silhouette() {
    // Direct rendering of the resting pose.
    let mut direct = test_engine();
    direct.tick(0.0);

    // Shader compositing of the same pose.
    let mut composited = test_engine();
    let shader = Rc::new(RefCell::new(filled_surface(16, 16, Rgba::opaque(200, 40, 40))));
    composited.set_shader_source(Some(shader), CompositeMode::Figure);
    composited.tick(0.0);

    let mut shown = 0usize;
    for y in 0..64 {
        for x in 0..64 {
            let in_composite = composited.surface().pixel(x, y).a > 0;
            let in_silhouette = direct.surface().pixel(x, y).a > 0;
            if in_composite {
                shown += 1;
                assert!(
                    in_silhouette,
                    "composited pixel ({x}, {y}) outside the silhouette"
                );
            }
            // With a fully opaque shader the composite also covers the
            // whole silhouette: the two are pixel-aligned, not just nested.
            if in_silhouette {
                assert!(in_composite, "silhouette pixel ({x}, {y}) lost by the mask");
            }
        }
    }
    // The composite actually produced something.
    assert!(shown > 0);
}

#[test]
fn missing_shader_surface_falls_back_to_direct_drawing() {
    let mut direct = test_engine();
    direct.tick(0.0);

    let mut degraded = test_engine();
    degraded.set_shader_source(
        Some(Rc::new(RefCell::new(Surface::new(0, 0)))),
        CompositeMode::Figure,
    );
    degraded.tick(0.0);

    assert_eq!(direct.surface().as_slice(), degraded.surface().as_slice());
}

#[test]
fn direct_rendering_paints_the_center_fill() {
    let mut engine = test_engine();
    engine.tick(0.0);
    // The surface center lies inside the filled center square.
    let pixel = engine.surface().pixel(32, 32);
    assert!(pixel.a > 0);
}

#[test]
fn rotation_capture_happens_at_scheduling_time() {
    let mut engine = test_engine();
    engine.tick(0.0);
    engine.request(Gesture::Rotate45Center);
    // Queued while the first rotation is mid-flight: the second captured
    // the pose as of its own scheduling call.
    engine.tick(500.0);
    engine.request(Gesture::Rotate45Center);
    engine.tick(1000.0);
    engine.tick(2000.0);

    // First rotation ended at 90; the second was captured at the mid-flight
    // pose and lands 45 past it.
    let center = &engine.figure.squares[2];
    assert!(center.rotation > 90.0 && center.rotation < 135.0);
    assert!(!engine.is_animating());
}
