//! GPU device management.
//!
//! Bitmaps are rendered offscreen, so only surface-less device acquisition
//! lives here.

mod headless;

pub use headless::{HeadlessInit, request_headless_device};
