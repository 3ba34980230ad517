use std::hash::Hash;

use indexmap::IndexSet;

use crate::codec::Rect;

/// Uniform bucket grid over a bounded area. Payloads are stored in every
/// bucket their rectangle touches; rectangles outside the bounds are clamped
/// to the border buckets.
pub struct SpatialRectIndex<T> {
    bounds: Rect,
    bucket_size: i32,
    columns: i32,
    rows: i32,
    buckets: Vec<Vec<T>>,
}

impl<T: Copy + Eq + Hash> SpatialRectIndex<T> {
    pub fn new(bounds: Rect, bucket_size: i32) -> Self {
        assert!(bucket_size > 0, "bucket size must be positive");
        let columns = ((bounds.width + bucket_size - 1) / bucket_size).max(1);
        let rows = ((bounds.height + bucket_size - 1) / bucket_size).max(1);
        Self {
            bounds,
            bucket_size,
            columns,
            rows,
            buckets: (0..columns * rows).map(|_| Vec::new()).collect(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Inclusive bucket range touched by `rect`
    fn bucket_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let to_col = |x: i32| ((x - self.bounds.x).div_euclid(self.bucket_size)).clamp(0, self.columns - 1);
        let to_row = |y: i32| ((y - self.bounds.y).div_euclid(self.bucket_size)).clamp(0, self.rows - 1);
        // a zero-sized rect still lands in the bucket of its corner
        let right = (rect.right() - 1).max(rect.x);
        let bottom = (rect.bottom() - 1).max(rect.y);
        (to_col(rect.x), to_row(rect.y), to_col(right), to_row(bottom))
    }

    pub fn add(&mut self, rect: &Rect, payload: T) {
        let (c0, r0, c1, r1) = self.bucket_range(rect);
        for r in r0..=r1 {
            for c in c0..=c1 {
                self.buckets[(r * self.columns + c) as usize].push(payload);
            }
        }
    }

    /// Payloads in any bucket `query` touches, each once, in first-seen order.
    /// Candidates still need an exact geometric test.
    pub fn overlapping(&self, query: &Rect) -> IndexSet<T> {
        let mut found = IndexSet::new();
        let (c0, r0, c1, r1) = self.bucket_range(query);
        for r in r0..=r1 {
            for c in c0..=c1 {
                found.extend(self.buckets[(r * self.columns + c) as usize].iter().copied());
            }
        }
        found
    }
}
