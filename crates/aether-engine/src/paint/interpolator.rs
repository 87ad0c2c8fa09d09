//! Keyframe tables with linear interpolation by position.

use super::Color;

/// Values that can be blended linearly with a coefficient `c` in `[0, 1]`.
pub trait Lerp: Copy {
    fn lerp(self, to: Self, c: f32) -> Self;
}

impl Lerp for f32 {
    /// `a*(1-c) + b*c`: returns the endpoints exactly at `c == 0` and `c == 1`.
    #[inline]
    fn lerp(self, to: f32, c: f32) -> f32 {
        self * (1.0 - c) + to * c
    }
}

impl Lerp for Color {
    #[inline]
    fn lerp(self, to: Color, c: f32) -> Color {
        Color::lerp(self, to, c)
    }
}

/// Sorted `(position, value)` keyframes. Positions are unique.
///
/// Lookup semantics:
/// - positions between two keys interpolate linearly
/// - positions before the first key clamp to the first value
/// - positions at or after the last key clamp to the last value
/// - a single key yields that value everywhere
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeyTable<V> {
    keys: Vec<(f32, V)>,
}

impl<V> Default for KeyTable<V> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<V: Lerp> KeyTable<V> {
    /// Inserts a keyframe, overwriting any existing key at the same position.
    pub(crate) fn insert(&mut self, position: f32, value: V) {
        debug_assert!(position.is_finite(), "keyframe position must be finite");
        // -0.0 and 0.0 are the same position.
        let position = position + 0.0;
        match self.keys.binary_search_by(|(p, _)| p.total_cmp(&position)) {
            Ok(i) => self.keys[i].1 = value,
            Err(i) => self.keys.insert(i, (position, value)),
        }
    }

    /// # Panics
    /// Panics when the table has no keys.
    pub(crate) fn sample(&self, at: f32) -> V {
        assert!(!self.keys.is_empty(), "cannot sample an empty keyframe table");
        if self.keys.len() == 1 {
            return self.keys[0].1;
        }

        // Smallest i with keys[i+1] >= at, clamped to the last segment.
        let first_ge = self.keys.partition_point(|(p, _)| *p < at);
        let i = first_ge.saturating_sub(1).min(self.keys.len() - 2);

        let (p0, v0) = self.keys[i];
        let (p1, v1) = self.keys[i + 1];
        let c = (at - p0) / (p1 - p0);
        let c = if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
        v0.lerp(v1, c)
    }

    /// `count` samples evenly spaced over `[from, to]`.
    ///
    /// `count == 1` yields a single sample at `from`.
    pub(crate) fn samples(&self, from: f32, to: f32, count: usize) -> Vec<V> {
        match count {
            0 => Vec::new(),
            1 => vec![self.sample(from)],
            n => {
                let last = (n - 1) as f32;
                (0..n)
                    .map(|i| self.sample(from + (i as f32 / last) * (to - from)))
                    .collect()
            }
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (f32, V)> + '_ {
        self.keys.iter().copied()
    }
}

/// Scalar keyframe table.
///
/// ```
/// use aether_engine::paint::Interpolator;
///
/// let mut i = Interpolator::new();
/// i.add(0.0, 10.0);
/// i.add(1.0, 20.0);
/// assert_eq!(i.value(0.5), 15.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpolator {
    table: KeyTable<f32>,
}

impl Interpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the keyframe at `position`.
    pub fn add(&mut self, position: f32, value: f32) {
        self.table.insert(position, value);
    }

    /// Interpolated value at `position` (clamped to the key range).
    ///
    /// # Panics
    /// Panics if no keyframe has been added.
    pub fn value(&self, position: f32) -> f32 {
        self.table.sample(position)
    }

    /// `count` evenly spaced samples over `[from, to]`.
    pub fn values(&self, from: f32, to: f32, count: usize) -> Vec<f32> {
        self.table.samples(from, to, count)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Keyframes in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.table.iter()
    }
}

impl FromIterator<(f32, f32)> for Interpolator {
    fn from_iter<I: IntoIterator<Item = (f32, f32)>>(iter: I) -> Self {
        let mut out = Interpolator::new();
        for (p, v) in iter {
            out.add(p, v);
        }
        out
    }
}
