//! Texture resources.

mod bitmap;

pub use bitmap::{Bitmap, TextureId, WeakBitmap};
