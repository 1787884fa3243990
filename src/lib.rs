// src/lib.rs

//! A software-rendered animation engine for the three-square orb figure.
//!
//! The engine is purely reactive and frame-driven: a driver calls
//! [`engine::OrbEngine::tick`] once per display refresh and triggers
//! gestures in response to its own input sources. Rendering happens into an
//! owned RGBA [`surface::Surface`]; in shader mode the output of a
//! procedural [`shader::ShaderRig`] is composited through a mask built from
//! the figure's live silhouette.

pub mod animation;
pub mod color;
pub mod config;
pub mod easing;
pub mod engine;
pub mod geometry;
pub mod shader;
pub mod surface;

// Re-export the types a driver touches, so simple embeddings only need the
// crate root.
pub use color::{Rgba, Theme};
pub use config::OrbConfig;
pub use engine::{AlertOptions, CompositeMode, Directive, Gesture, OrbEngine};
pub use geometry::{Figure, Square, SquareOptions};
pub use shader::{ShaderKind, ShaderRig, SharedSurface};
pub use surface::Surface;
