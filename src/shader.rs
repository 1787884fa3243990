// src/shader.rs

//! Procedural shader sources for the `Figure` composite mode.
//!
//! The engine treats the shader as an external, continuously redrawn pixel
//! surface it only ever reads. A [`ShaderRig`] owns one of the two
//! generators and a shared surface handle; the driver calls
//! [`ShaderRig::render`] once per frame and hands a clone of the handle to
//! the engine via `set_shader_source`. Until the first render the surface
//! is zero-sized and the engine falls back to direct figure drawing.

use crate::color::Rgba;
use crate::surface::Surface;

use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

/// Shared read-mostly surface handle, single-threaded. The engine borrows
/// it immutably during the draw pass, the rig mutably while regenerating
/// pixels, never both at once.
pub type SharedSurface = Rc<RefCell<Surface>>;

/// Parameters for the mesh-gradient generator.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGradientParams {
    pub colors: Vec<Rgba>,
    pub distortion: f64,
    pub swirl: f64,
    pub speed: f64,
}

impl Default for MeshGradientParams {
    fn default() -> Self {
        MeshGradientParams {
            colors: vec![
                Rgba::opaque(0xff, 0xff, 0xff),
                Rgba::opaque(0xa3, 0xa3, 0xa3),
                Rgba::opaque(0xe5, 0xe5, 0xe5),
            ],
            distortion: 0.9,
            swirl: 0.6,
            speed: 0.2,
        }
    }
}

/// Parameters for the liquid-metal generator.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidMetalParams {
    pub color_back: Rgba,
    pub color_tint: Rgba,
    pub repetition: f64,
    pub softness: f64,
    pub shift_red: f64,
    pub shift_blue: f64,
    pub distortion: f64,
    pub contour: f64,
    pub speed: f64,
}

impl Default for LiquidMetalParams {
    fn default() -> Self {
        LiquidMetalParams {
            color_back: Rgba::WHITE,
            color_tint: Rgba::WHITE,
            repetition: 4.0,
            softness: 0.3,
            shift_red: 0.3,
            shift_blue: 0.3,
            distortion: 0.1,
            contour: 1.0,
            speed: 1.0,
        }
    }
}

/// The two procedural shader types.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderKind {
    MeshGradient(MeshGradientParams),
    LiquidMetal(LiquidMetalParams),
}

/// A generator plus the shared surface it renders into.
pub struct ShaderRig {
    kind: ShaderKind,
    surface: SharedSurface,
}

impl ShaderRig {
    pub fn new(kind: ShaderKind, width: u32, height: u32) -> Self {
        ShaderRig {
            kind,
            surface: Rc::new(RefCell::new(Surface::new(width, height))),
        }
    }

    /// A handle for the engine. Cloning the `Rc` keeps both sides looking
    /// at the same pixels.
    pub fn surface(&self) -> SharedSurface {
        Rc::clone(&self.surface)
    }

    /// Regenerates the shader pixels for the given time.
    pub fn render(&mut self, time_ms: f64) {
        let mut surface = self.surface.borrow_mut();
        match &self.kind {
            ShaderKind::MeshGradient(params) => render_mesh_gradient(&mut surface, params, time_ms),
            ShaderKind::LiquidMetal(params) => render_liquid_metal(&mut surface, params, time_ms),
        }
    }
}

/// Blends the configured colors by inverse-square distance to control
/// points orbiting the frame, after a radius-proportional swirl and a
/// sinusoidal warp of the sampling position.
fn render_mesh_gradient(surface: &mut Surface, params: &MeshGradientParams, time_ms: f64) {
    let width = surface.width();
    let height = surface.height();
    if width == 0 || height == 0 || params.colors.is_empty() {
        return;
    }
    let t = time_ms * 0.001 * params.speed;

    for y in 0..height {
        for x in 0..width {
            let mut u = (x as f64 + 0.5) / width as f64 - 0.5;
            let mut v = (y as f64 + 0.5) / height as f64 - 0.5;

            let radius = (u * u + v * v).sqrt();
            let angle = params.swirl * 3.0 * radius + t * 0.5;
            let (sin_a, cos_a) = angle.sin_cos();
            let (ru, rv) = (u * cos_a - v * sin_a, u * sin_a + v * cos_a);
            u = ru + params.distortion * 0.1 * (6.0 * rv + t).sin();
            v = rv + params.distortion * 0.1 * (6.0 * ru - t).cos();

            let mut r = 0.0;
            let mut g = 0.0;
            let mut b = 0.0;
            let mut total = 0.0;
            for (index, color) in params.colors.iter().enumerate() {
                let phase = index as f64 * 2.0 * PI / params.colors.len() as f64;
                let px = 0.35 * (t + phase).sin();
                let py = 0.35 * (t * 0.8 + phase * 1.3).cos();
                let d2 = (u - px) * (u - px) + (v - py) * (v - py);
                let weight = 1.0 / (d2 + 0.05);
                r += color.r as f64 * weight;
                g += color.g as f64 * weight;
                b += color.b as f64 * weight;
                total += weight;
            }
            surface.set_pixel(
                x,
                y,
                Rgba::opaque(
                    (r / total).round() as u8,
                    (g / total).round() as u8,
                    (b / total).round() as u8,
                ),
            );
        }
    }
}

/// Banded interference pattern over a distorted radial field, softened by a
/// smoothstep and chromatically shifted per channel, mixed between the back
/// and tint colors.
fn render_liquid_metal(surface: &mut Surface, params: &LiquidMetalParams, time_ms: f64) {
    let width = surface.width();
    let height = surface.height();
    if width == 0 || height == 0 {
        return;
    }
    let t = time_ms * 0.001 * params.speed;
    let half = width.min(height) as f64 / 2.0;

    for y in 0..height {
        for x in 0..width {
            let u = (x as f64 + 0.5 - width as f64 / 2.0) / half;
            let v = (y as f64 + 0.5 - height as f64 / 2.0) / half;
            let radius = (u * u + v * v).sqrt();
            let phi = v.atan2(u);
            let field = radius * 4.0 + params.distortion * (phi * 3.0 + t * 2.0).sin();

            let band = |shift: f64| {
                let wave = 0.5 + 0.5 * (params.repetition * PI * field - t * 3.0 + shift).sin();
                let soft = smoothstep(0.5 - params.softness, 0.5 + params.softness, wave);
                soft.powf(params.contour.max(f64::EPSILON))
            };

            let mix = |from: u8, to: u8, amount: f64| {
                (from as f64 + (to as f64 - from as f64) * amount).round() as u8
            };
            surface.set_pixel(
                x,
                y,
                Rgba::opaque(
                    mix(params.color_back.r, params.color_tint.r, band(params.shift_red)),
                    mix(params.color_back.g, params.color_tint.g, band(0.0)),
                    mix(params.color_back.b, params.color_tint.b, band(-params.shift_blue)),
                ),
            );
        }
    }
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_gradient_fills_opaque_pixels() {
        let mut rig = ShaderRig::new(
            ShaderKind::MeshGradient(MeshGradientParams::default()),
            8,
            8,
        );
        rig.render(125.0);
        let surface = rig.surface();
        let surface = surface.borrow();
        assert!(surface.as_slice().iter().all(|p| p.a == 255));
    }

    #[test]
    fn liquid_metal_stays_between_back_and_tint() {
        let params = LiquidMetalParams {
            color_back: Rgba::opaque(10, 10, 10),
            color_tint: Rgba::opaque(200, 200, 200),
            ..Default::default()
        };
        let mut rig = ShaderRig::new(ShaderKind::LiquidMetal(params), 8, 8);
        rig.render(400.0);
        let surface = rig.surface();
        let surface = surface.borrow();
        for pixel in surface.as_slice() {
            assert!(pixel.r >= 10 && pixel.r <= 200);
            assert!(pixel.a == 255);
        }
    }

    #[test]
    fn render_is_deterministic_for_a_timestamp() {
        let mut a = ShaderRig::new(
            ShaderKind::MeshGradient(MeshGradientParams::default()),
            6,
            6,
        );
        let mut b = ShaderRig::new(
            ShaderKind::MeshGradient(MeshGradientParams::default()),
            6,
            6,
        );
        a.render(777.0);
        b.render(777.0);
        assert_eq!(
            a.surface().borrow().as_slice(),
            b.surface().borrow().as_slice()
        );
    }

    #[test]
    fn handle_sees_new_pixels_after_render() {
        let mut rig = ShaderRig::new(
            ShaderKind::MeshGradient(MeshGradientParams::default()),
            4,
            4,
        );
        let handle = rig.surface();
        let before = handle.borrow().as_slice().to_vec();
        rig.render(5000.0);
        let after = handle.borrow().as_slice().to_vec();
        assert_ne!(before, after);
    }

    #[test]
    fn smoothstep_clamps_and_interpolates() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-9);
        // Degenerate edge pair acts as a step.
        assert_eq!(smoothstep(0.5, 0.5, 0.4), 0.0);
        assert_eq!(smoothstep(0.5, 0.5, 0.6), 1.0);
    }
}
