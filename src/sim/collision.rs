//! Geometric hit tests shared by projectiles and area weapons

use glam::Vec2;

/// Closest point on segment `a -> b` to `p`.
///
/// A zero-length segment degenerates to `a`.
#[inline]
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let denom = ab.length_squared().max(1e-6);
    let t = ((p - a).dot(ab) / denom).clamp(0.0, 1.0);
    a + ab * t
}

/// Swept hit test: is the closest point on `a -> b` within `radius` of `point`?
///
/// Used for fast projectiles so a small target is never skipped between
/// two frames' endpoints.
#[inline]
pub fn sweep_segment_vs_point(a: Vec2, b: Vec2, point: Vec2, radius: f32) -> bool {
    closest_point_on_segment(a, b, point).distance_squared(point) < radius * radius
}

/// Even-odd ray-casting point-in-polygon test.
///
/// The ring is implicitly closed (last vertex connects to the first).
/// Rings with fewer than three vertices contain nothing.
pub fn point_in_polygon(point: Vec2, ring: &[Vec2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (pi, pj) = (ring[i], ring[j]);
        let crosses = (pi.y > point.y) != (pj.y > point.y);
        if crosses {
            let x_at = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y + 1e-6) + pi.x;
            if point.x < x_at {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned box on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn contains(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x < self.half.x && d.y < self.half.y
    }

    /// Minimum-axis push that moves a circle of `radius` at `p` out of the box.
    /// Returns `None` if there is no overlap.
    pub fn push_out(&self, p: Vec2, radius: f32) -> Option<Vec2> {
        let d = p - self.center;
        let ext = self.half + Vec2::splat(radius);
        if d.x.abs() >= ext.x || d.y.abs() >= ext.y {
            return None;
        }
        let px = ext.x - d.x.abs();
        let pz = ext.y - d.y.abs();
        let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
        Some(if px < pz {
            Vec2::new(sign(d.x) * px, 0.0)
        } else {
            Vec2::new(0.0, sign(d.y) * pz)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_hits_target_between_endpoints() {
        // both endpoints are far from the target, the path passes through it
        let a = Vec2::new(-5.0, 0.0);
        let b = Vec2::new(5.0, 0.0);
        assert!(sweep_segment_vs_point(a, b, Vec2::new(0.0, 0.3), 0.55));
        assert!(!sweep_segment_vs_point(a, b, Vec2::new(0.0, 0.6), 0.55));
    }

    #[test]
    fn test_sweep_clamps_to_segment_ends() {
        let a = Vec2::ZERO;
        let b = Vec2::new(1.0, 0.0);
        assert!(!sweep_segment_vs_point(a, b, Vec2::new(2.0, 0.0), 0.55));
        assert!(sweep_segment_vs_point(a, b, Vec2::new(1.5, 0.0), 0.55));
    }

    #[test]
    fn test_sweep_degenerate_segment() {
        let p = Vec2::new(1.0, 1.0);
        assert!(sweep_segment_vs_point(p, p, Vec2::new(1.2, 1.0), 0.55));
        let c = closest_point_on_segment(p, p, Vec2::new(9.0, 9.0));
        assert!(c.is_finite());
    }

    #[test]
    fn test_point_in_polygon_square() {
        let ring = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        assert!(point_in_polygon(Vec2::new(2.0, 2.0), &ring));
        assert!(!point_in_polygon(Vec2::new(5.0, 2.0), &ring));
        assert!(!point_in_polygon(Vec2::new(-1.0, 2.0), &ring));
    }

    #[test]
    fn test_point_in_polygon_concave() {
        // U shape: the notch is outside
        let ring = [
            Vec2::new(0.0, 0.0),
            Vec2::new(6.0, 0.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(4.0, 6.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 6.0),
            Vec2::new(0.0, 6.0),
        ];
        assert!(point_in_polygon(Vec2::new(1.0, 4.0), &ring));
        assert!(!point_in_polygon(Vec2::new(3.0, 4.0), &ring));
    }

    #[test]
    fn test_point_in_polygon_degenerate_ring() {
        assert!(!point_in_polygon(Vec2::ZERO, &[Vec2::ZERO, Vec2::X]));
    }

    #[test]
    fn test_aabb_push_out_minimum_axis() {
        let b = Aabb {
            center: Vec2::ZERO,
            half: Vec2::splat(2.0),
        };
        let push = b.push_out(Vec2::new(2.3, 0.5), 0.5).unwrap();
        assert!((push.x - 0.2).abs() < 1e-5);
        assert_eq!(push.y, 0.0);
        assert!(b.push_out(Vec2::new(3.0, 0.0), 0.5).is_none());
    }
}
