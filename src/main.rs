// src/main.rs

//! Headless demo driver for the orb engine.
//!
//! Builds the engine from [`CONFIG`], runs a fixed-length frame loop with
//! scripted gesture triggers standing in for pointer/keyboard input, and
//! optionally writes PPM snapshots of selected frames (set
//! `ORB_SNAPSHOT_DIR` to a writable directory).

use orb_engine::config::CONFIG;
use orb_engine::{
    AlertOptions, CompositeMode, Directive, Figure, Gesture, OrbEngine, Rgba, ShaderRig, Surface,
    Theme,
};

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Simulated display refresh interval (60 Hz).
const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;
/// Total frames the demo runs: ten simulated seconds.
const TOTAL_FRAMES: u32 = 600;
/// Frames snapshotted when `ORB_SNAPSHOT_DIR` is set.
const SNAPSHOT_FRAMES: [u32; 5] = [0, 90, 210, 330, 599];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let config = &*CONFIG;
    let width = config.appearance.width;
    let height = config.appearance.height;
    let theme = config.appearance.theme;
    info!("starting orb demo: {}x{}, {:?} theme", width, height, theme);

    let figure = Figure::orb(width, height, theme.base_color());
    let surface = Surface::new(width, height);
    let mut engine =
        OrbEngine::new(figure, surface).context("failed to initialize orb engine")?;

    let mut shader_rig = config
        .shader
        .as_ref()
        .map(|description| ShaderRig::new(description.to_kind(), width, height));
    if let Some(rig) = &shader_rig {
        engine.set_shader_source(Some(rig.surface()), CompositeMode::Figure);
        info!("shader attached; compositing through the figure silhouette");
    }

    if let Some(name) = config.initial_gesture.as_deref() {
        match Directive::from_name(name) {
            Some(directive) => {
                info!("applying initial gesture {:?}", name);
                engine.apply_directive(directive);
            }
            None => debug!("unrecognized initial gesture {:?}; ignoring", name),
        }
    }

    let snapshot_dir = std::env::var_os("ORB_SNAPSHOT_DIR").map(PathBuf::from);
    if let Some(dir) = &snapshot_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create snapshot directory {}", dir.display()))?;
    }

    for frame in 0..TOTAL_FRAMES {
        let now = frame as f64 * FRAME_INTERVAL_MS;
        if let Some(rig) = shader_rig.as_mut() {
            rig.render(now);
        }

        run_scripted_triggers(&mut engine, frame);
        engine.tick(now);

        if let Some(dir) = &snapshot_dir {
            if SNAPSHOT_FRAMES.contains(&frame) {
                let path = dir.join(format!("orb-{:04}.ppm", frame));
                write_snapshot(engine.surface(), &path, snapshot_background(theme))
                    .with_context(|| format!("failed to write snapshot {}", path.display()))?;
                info!("wrote snapshot {}", path.display());
            }
        }
    }

    info!("demo finished after {} frames", TOTAL_FRAMES);
    Ok(())
}

/// The gesture script: an explode (queued if something is already running,
/// the way a click handler would), a spin, a two-pulse alert, and a final
/// reset back to the canonical pose.
fn run_scripted_triggers(engine: &mut OrbEngine, frame: u32) {
    match frame {
        60 => {
            if engine.is_animating() {
                engine.queue_gesture(Gesture::Explode);
            } else {
                engine.request(Gesture::Explode);
            }
        }
        180 => engine.request(Gesture::Spin),
        300 => engine.request(Gesture::Alert(AlertOptions {
            from: "#ff3b30".to_string(),
            to: Some("#007aff".to_string()),
            duration_ms: None,
            repetitions: Some(2),
        })),
        480 => engine.request(Gesture::Reset),
        _ => {}
    }
}

fn snapshot_background(theme: Theme) -> Rgba {
    match theme {
        Theme::Dark => Rgba::opaque(18, 18, 18),
        Theme::Light => Rgba::opaque(245, 245, 245),
    }
}

/// Writes the surface as binary PPM, composited over a solid background
/// (PPM carries no alpha).
fn write_snapshot(surface: &Surface, path: &Path, background: Rgba) -> Result<()> {
    let width = surface.width();
    let height = surface.height();
    let mut out = Vec::with_capacity(32 + width * height * 3);
    out.extend_from_slice(format!("P6\n{} {}\n255\n", width, height).as_bytes());
    for pixel in surface.as_slice() {
        let alpha = pixel.a as f64 / 255.0;
        let over = |src: u8, bg: u8| (bg as f64 + (src as f64 - bg as f64) * alpha).round() as u8;
        out.push(over(pixel.r, background.r));
        out.push(over(pixel.g, background.g));
        out.push(over(pixel.b, background.b));
    }
    std::fs::write(path, out)?;
    Ok(())
}
