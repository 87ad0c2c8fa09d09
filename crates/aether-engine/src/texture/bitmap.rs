use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::{Rect, Size};
use crate::scene::Node;

/// Process-unique bitmap identity, used by backends to key GPU uploads.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TextureId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// CPU-side 2D image: a `width × height` buffer of packed BGRA texels.
///
/// `Bitmap` is a shared handle. Cloning adds a reference; `detach` (or drop)
/// releases one. When the last reference goes away the bitmap's scene node is
/// detached from its parent, which is how owners observe the release.
///
/// Pixel layout: row-major, one `u32` per texel as produced by
/// [`Color::bgra`](crate::paint::Color::bgra).
#[derive(Clone)]
pub struct Bitmap {
    inner: Rc<BitmapInner>,
}

struct BitmapInner {
    id: TextureId,
    node: Node,
    width: u32,
    height: u32,
    pixels: RefCell<Vec<u32>>,
    generation: Cell<u64>,
}

impl Drop for BitmapInner {
    fn drop(&mut self) {
        self.node.detach();
    }
}

impl Bitmap {
    /// Allocates a transparent-black bitmap as a child of `parent`.
    ///
    /// # Panics
    /// Panics if either dimension is zero or `parent` is detached.
    pub fn new(parent: &Node, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "bitmap size must be non-zero ({width}x{height})");
        let node = parent.child("bitmap");
        Self {
            inner: Rc::new(BitmapInner {
                id: TextureId::next(),
                node,
                width,
                height,
                pixels: RefCell::new(vec![0; width as usize * height as usize]),
                generation: Cell::new(0),
            }),
        }
    }

    /// Allocates a bitmap and uploads `pixels` in one step.
    pub fn with_pixels(parent: &Node, width: u32, height: u32, pixels: &[u32]) -> Self {
        let b = Self::new(parent, width, height);
        b.set_pixels(pixels);
        b
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.inner.id
    }

    #[inline]
    pub fn node(&self) -> &Node {
        &self.inner.node
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.inner.width as f32, self.inner.height as f32)
    }

    /// Full-extent rectangle in texel space.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }

    /// Incremented by every `set_pixels`; backends re-upload when it changes.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.inner.generation.get()
    }

    #[inline]
    pub fn pixels(&self) -> Ref<'_, [u32]> {
        Ref::map(self.inner.pixels.borrow(), Vec::as_slice)
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.inner.pixels.borrow()[(y * self.inner.width + x) as usize]
    }

    /// Replaces the whole pixel buffer.
    ///
    /// # Panics
    /// Panics if `pixels.len() != width * height`.
    pub fn set_pixels(&self, pixels: &[u32]) {
        let expected = self.inner.width as usize * self.inner.height as usize;
        assert_eq!(
            pixels.len(),
            expected,
            "pixel buffer length mismatch for {}x{} bitmap",
            self.inner.width,
            self.inner.height
        );
        self.inner.pixels.borrow_mut().copy_from_slice(pixels);
        self.inner.generation.set(self.inner.generation.get() + 1);
    }

    /// Texel bytes in memory order (B, G, R, A per texel).
    pub fn to_bgra_bytes(&self) -> Vec<u8> {
        self.inner
            .pixels
            .borrow()
            .iter()
            .flat_map(|p| p.to_le_bytes())
            .collect()
    }

    /// Number of live handles to this bitmap.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Bitmap) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[inline]
    pub fn downgrade(&self) -> WeakBitmap {
        WeakBitmap { inner: Rc::downgrade(&self.inner) }
    }

    /// Releases this handle. Other holders keep the bitmap alive.
    pub fn detach(self) {
        log::trace!("bitmap {:?}: release (refs before={})", self.inner.id, self.ref_count());
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("id", &self.inner.id)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// Non-owning bitmap reference; does not keep pixels or the node alive.
#[derive(Clone, Debug)]
pub struct WeakBitmap {
    inner: Weak<BitmapInner>,
}

impl WeakBitmap {
    /// A reference that was never attached to a bitmap.
    pub(crate) fn dangling() -> Self {
        WeakBitmap { inner: Weak::new() }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    #[inline]
    pub fn upgrade(&self) -> Option<Bitmap> {
        self.inner.upgrade().map(|inner| Bitmap { inner })
    }
}
