//! Aether engine crate.
//!
//! Paint model (colors, keyframe gradients, paint strategies), bitmap
//! resources attached to scene nodes, and asynchronous draw submission with a
//! wgpu backend.

pub mod coords;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod texture;
