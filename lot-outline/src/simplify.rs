use crate::{Point, Ring};

/// Douglas-Peucker parameters.
#[derive(Debug, Clone, Copy)]
pub struct SimplifyOptions {
    /// Squared distance threshold in grid units.
    pub tolerance_sq: f64,
    /// Fixed-point scale applied to coordinates before measuring distances.
    pub scale: i64,
    /// Vertices on `x == 0 | x == width | y == 0 | y == height` are never removed.
    pub border: Option<(i32, i32)>,
    /// At most this many vertices between two kept vertices.
    pub max_run: usize,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            tolerance_sq: 2.0,
            scale: 1000,
            border: None,
            max_run: 40,
        }
    }
}

impl SimplifyOptions {
    pub fn with_border(width: i32, height: i32) -> Self {
        Self {
            border: Some((width, height)),
            ..Self::default()
        }
    }

    fn on_border(&self, (x, y): Point) -> bool {
        match self.border {
            Some((w, h)) => x == 0 || y == 0 || x == w || y == h,
            None => false,
        }
    }
}

/// Simplify a closed ring.
///
/// Border vertices, plus one vertex every `max_run` points, split the ring
/// into open runs that are reduced independently, so a long straight
/// stretch cannot drift arbitrarily far from the traced boundary.
pub fn simplify_ring(ring: &[Point], options: &SimplifyOptions) -> Ring {
    let n = ring.len();
    if n <= 4 {
        return merge_colinear(ring);
    }

    let mut necessary: Vec<bool> = ring.iter().map(|&p| options.on_border(p)).collect();
    if !necessary.iter().any(|&b| b) {
        necessary[0] = true;
        let far = farthest_from(ring, ring[0]);
        necessary[far] = true;
    }

    let first = necessary.iter().position(|&b| b).unwrap_or(0);
    let max_run = options.max_run.max(2);
    let mut since = 0;
    for step in 1..n {
        let i = (first + step) % n;
        since += 1;
        if necessary[i] {
            since = 0;
        } else if since >= max_run {
            necessary[i] = true;
            since = 0;
        }
    }

    let anchors: Vec<usize> = (0..n)
        .map(|step| (first + step) % n)
        .filter(|&i| necessary[i])
        .collect();

    let threshold = options.tolerance_sq * (options.scale * options.scale) as f64;
    let mut out = Vec::with_capacity(anchors.len() * 2);
    for (k, &a) in anchors.iter().enumerate() {
        let b = anchors[(k + 1) % anchors.len()];
        let len = if b > a { b - a } else { b + n - a };
        let run: Vec<Point> = (0..=len).map(|j| ring[(a + j) % n]).collect();
        let mut kept = reduce(&run, options.scale, threshold);
        // the run's last point is the next run's first
        kept.pop();
        out.extend(kept);
    }

    merge_colinear(&out)
}

fn farthest_from(ring: &[Point], origin: Point) -> usize {
    ring.iter()
        .enumerate()
        .max_by_key(|(_, &(x, y))| {
            let dx = (x - origin.0) as i64;
            let dy = (y - origin.1) as i64;
            dx * dx + dy * dy
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Open-polyline Douglas-Peucker in fixed-point units. Keeps both endpoints.
fn reduce(points: &[Point], scale: i64, threshold: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let a = scaled(points[lo], scale);
        let b = scaled(points[hi], scale);
        let mut max_dist = 0.0;
        let mut max_idx = lo;
        for (i, &p) in points.iter().enumerate().take(hi).skip(lo + 1) {
            let d = segment_distance_sq(scaled(p, scale), a, b);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }
        if max_dist > threshold {
            keep[max_idx] = true;
            stack.push((lo, max_idx));
            stack.push((max_idx, hi));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter(|(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

fn scaled((x, y): Point, scale: i64) -> (f64, f64) {
    ((x as i64 * scale) as f64, (y as i64 * scale) as f64)
}

fn segment_distance_sq(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        let ex = p.0 - a.0;
        let ey = p.1 - a.1;
        return ex * ex + ey * ey;
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let ex = p.0 - (a.0 + t * dx);
    let ey = p.1 - (a.1 + t * dy);
    ex * ex + ey * ey
}

fn colinear(a: Point, b: Point, c: Point) -> bool {
    (a.0 == b.0 && b.0 == c.0) || (a.1 == b.1 && b.1 == c.1)
}

/// Drop vertices in the middle of horizontal or vertical runs, and duplicates.
pub fn merge_colinear(ring: &[Point]) -> Ring {
    let mut out: Ring = Vec::with_capacity(ring.len());
    for &p in ring {
        if out.last() == Some(&p) {
            continue;
        }
        while out.len() >= 2 && colinear(out[out.len() - 2], out[out.len() - 1], p) {
            out.pop();
        }
        out.push(p);
    }

    // close the seam between the last and first points
    loop {
        let n = out.len();
        if n < 3 {
            break;
        }
        if out[n - 1] == out[0] {
            out.pop();
        } else if colinear(out[n - 2], out[n - 1], out[0]) {
            out.pop();
        } else if colinear(out[n - 1], out[0], out[1]) {
            out.remove(0);
        } else {
            break;
        }
    }

    out
}
