// src/geometry.rs

//! The orb's geometry model: `Square` shape-plus-pose objects and the
//! `Figure` that owns an ordered collection of them.
//!
//! A `Square` couples a static shape spec (size, colors, border width) with
//! the mutable pose the animation interpreter drives (rotation, scale,
//! motion blur) and the saved originals used to restore state when a
//! transient animation completes. Squares are owned exclusively by their
//! `Figure`; nothing outside the engine mutates them.

use crate::color::Rgba;

/// Construction options for a [`Square`].
///
/// Defaults: 100 px, unrotated, transparent fill, opaque black 4 px border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareOptions {
    pub size: f64,
    pub rotation: f64,
    pub color: Rgba,
    pub border_color: Rgba,
    pub border_width: f64,
    pub rotation_offset: f64,
}

impl Default for SquareOptions {
    fn default() -> Self {
        SquareOptions {
            size: 100.0,
            rotation: 0.0,
            color: Rgba::TRANSPARENT,
            border_color: Rgba::opaque(0, 0, 0),
            border_width: 4.0,
            rotation_offset: 0.0,
        }
    }
}

/// One animatable element of the figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Square {
    // Static shape spec.
    pub size: f64,
    pub rotation_offset: f64,
    pub border_width: f64,

    // Mutable pose, driven by the animation interpreter.
    pub rotation: f64,
    pub scale: f64,
    pub color: Rgba,
    pub border_color: Rgba,
    /// Total rotation applied by completed animations, kept modulo 360.
    pub accumulated_rotation: f64,
    /// Latch toggled by each completed 45-degree gesture; `reset` uses it
    /// to find squares that are off their canonical pose.
    pub is_rotated: bool,
    /// Ghost-trail intensity in 0..=0.3, nonzero only during full spins.
    /// A rendering hint, not a physical quantity.
    pub motion_blur: f64,

    // Saved originals, restored when transient animations complete.
    pub initial_rotation: f64,
    pub initial_scale: f64,
    pub original_color: Rgba,
    pub original_border_color: Rgba,
}

impl Square {
    pub fn new(options: SquareOptions) -> Self {
        Square {
            size: options.size,
            rotation_offset: options.rotation_offset,
            border_width: options.border_width,
            rotation: options.rotation,
            scale: 1.0,
            color: options.color,
            border_color: options.border_color,
            accumulated_rotation: 0.0,
            is_rotated: false,
            motion_blur: 0.0,
            initial_rotation: options.rotation,
            initial_scale: 1.0,
            original_color: options.color,
            original_border_color: options.border_color,
        }
    }

    /// The rotation actually rendered: animated rotation plus the static
    /// per-square offset.
    pub fn display_rotation(&self) -> f64 {
        self.rotation + self.rotation_offset
    }
}

/// An ordered sequence of squares sharing a common origin offset.
///
/// By convention the orb figure holds exactly three squares, back to front:
/// outer, middle, center. The figure is rebuilt (not mutated structurally)
/// whenever display size or theme changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub squares: Vec<Square>,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Figure {
    pub fn new(squares: Vec<Square>) -> Self {
        Figure {
            squares,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Builds the canonical three-square orb for a surface of the given
    /// pixel dimensions and theme base color.
    ///
    /// Proportions: the outer square spans half the smaller surface
    /// dimension; the middle square is 45% of the outer; the center square
    /// is 16% of the middle and is the only filled one. Borders are 15% of
    /// the outer size (20% of its own size for the center). All squares
    /// start rotated 45 degrees, so the orb reads as a diamond at rest.
    pub fn orb(width: u32, height: u32, base_color: Rgba) -> Self {
        let surface_size = width.min(height) as f64;
        let outer_size = surface_size * 0.5;
        let middle_size = outer_size * 0.45;
        let center_size = middle_size * 0.16;
        let border_width = outer_size * 0.15;

        Figure::new(vec![
            Square::new(SquareOptions {
                size: outer_size,
                rotation: 45.0,
                color: Rgba::TRANSPARENT,
                border_color: base_color,
                border_width,
                rotation_offset: 0.0,
            }),
            Square::new(SquareOptions {
                size: middle_size,
                rotation: 45.0,
                color: Rgba::TRANSPARENT,
                border_color: base_color,
                border_width,
                rotation_offset: 0.0,
            }),
            Square::new(SquareOptions {
                size: center_size,
                rotation: 45.0,
                color: base_color,
                border_color: base_color,
                border_width: center_size * 0.2,
                rotation_offset: 0.0,
            }),
        ])
    }
}
