//! Paint model.
//!
//! Scope:
//! - straight-alpha colors and keyframe interpolation
//! - paint strategies ([`Renderer`]) and the [`Paint`] façade
//! - gradient baking and the gradient-map blend pass
//!
//! Geometry types remain in `coords`.

pub mod color;
mod facade;
pub mod gradient;
mod gradient_map;
pub mod interpolator;
pub mod renderer;

pub use color::Color;
pub use facade::{BlendMode, Paint, PaintMode};
pub use gradient::ColorGradient;
pub use gradient_map::{GRADIENT_LUT_WIDTH, GradientPass};
pub use interpolator::{Interpolator, Lerp};
pub use renderer::{GRADIENT_BAKE_SIZE, LinearGradient, RadialGradient, Renderer, UvMode};
