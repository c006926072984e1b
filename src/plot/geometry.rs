//! Planar helpers for the two-variable chart: half-plane clipping of the
//! visible box and clipping of constraint lines to it.

use crate::domain::Operator;

pub type Point = (f64, f64);

const EPS: f64 = 1e-9;

/// Visible axis range `[0, limit]` shared by both axes
pub fn axis_limit(x: f64, y: f64, scale: f64, minimum: f64) -> f64 {
    let largest = x.max(y);
    if largest.is_finite() {
        (largest * scale).max(minimum)
    } else {
        minimum
    }
}

/// Square `[0, limit]²`, counter-clockwise
pub fn square(limit: f64) -> Vec<Point> {
    vec![(0.0, 0.0), (limit, 0.0), (limit, limit), (0.0, limit)]
}

/// Keeps the part of `polygon` where `a·x + b·y <= c` (Sutherland–Hodgman, one edge)
pub fn clip_le(polygon: &[Point], a: f64, b: f64, c: f64) -> Vec<Point> {
    let value = |p: Point| a * p.0 + b * p.1;
    let inside = |p: Point| value(p) <= c + EPS;
    let crossing = |p: Point, q: Point| {
        let (fp, fq) = (value(p), value(q));
        let t = ((c - fp) / (fq - fp)).clamp(0.0, 1.0);
        (p.0 + t * (q.0 - p.0), p.1 + t * (q.1 - p.1))
    };

    let n = polygon.len();
    let mut out = Vec::with_capacity(n + 1);
    for i in 0..n {
        let cur = polygon[i];
        let prev = polygon[(i + n - 1) % n];
        match (inside(prev), inside(cur)) {
            (true, true) => out.push(cur),
            (false, true) => {
                out.push(crossing(prev, cur));
                out.push(cur);
            }
            (true, false) => out.push(crossing(prev, cur)),
            (false, false) => {}
        }
    }
    out
}

/// Intersects `polygon` with the half-plane (or line, for equalities) of `a·x + b·y op rhs`
pub fn clip_constraint(polygon: &[Point], a: f64, b: f64, operator: Operator, rhs: f64) -> Vec<Point> {
    match operator {
        Operator::Le => clip_le(polygon, a, b, rhs),
        Operator::Ge => clip_le(polygon, -a, -b, -rhs),
        Operator::Eq => {
            let lower = clip_le(polygon, a, b, rhs);
            clip_le(&lower, -a, -b, -rhs)
        }
    }
}

/// Shoelace area, unsigned
pub fn area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let (x1, y1) = polygon[i];
            let (x2, y2) = polygon[(i + 1) % n];
            x1 * y2 - x2 * y1
        })
        .sum();
    twice.abs() / 2.0
}

/// Visible segment of the line `a·x + b·y = c` inside `[0, limit]²`
pub fn clip_line_to_square(a: f64, b: f64, c: f64, limit: f64) -> Option<(Point, Point)> {
    let in_range = |v: f64| v >= -EPS && v <= limit + EPS;
    let mut hits: Vec<Point> = Vec::with_capacity(4);

    if b.abs() > EPS {
        for x in [0.0, limit] {
            let y = (c - a * x) / b;
            if in_range(y) {
                hits.push((x, y.clamp(0.0, limit)));
            }
        }
    }
    if a.abs() > EPS {
        for y in [0.0, limit] {
            let x = (c - b * y) / a;
            if in_range(x) {
                hits.push((x.clamp(0.0, limit), y));
            }
        }
    }

    let dist2 = |p: Point, q: Point| (p.0 - q.0).powi(2) + (p.1 - q.1).powi(2);
    let mut best: Option<(Point, Point)> = None;
    let mut best_len = EPS;
    for (i, &p) in hits.iter().enumerate() {
        for &q in &hits[i + 1..] {
            let len = dist2(p, q);
            if len > best_len {
                best_len = len;
                best = Some((p, q));
            }
        }
    }
    best
}
