//! Scene-node protocol.
//!
//! Only the narrow contract needed by paints and bitmaps lives here: a parent
//! chain, attach/detach, and live-child accounting for leak checks.

mod node;

pub use node::Node;
