use glam::Vec2;

/// Result of a successful ray/segment crossing.
#[derive(Clone, Copy, Debug)]
pub struct SegHit {
    /// Ray parameter at the crossing, in units of `dir`'s length.
    pub dist: f32,
    pub point: Vec2,
    /// Signed offset of the hit along the segment, measured from the
    /// first endpoint.  Doubles as the horizontal texture coordinate.
    pub offset: f32,
}

/// Intersect a forward ray with a line segment.
///
/// `normal`, `seg_dir` and `plane_dist` are the segment's precomputed
/// unit normal, direction and signed plane offset (`normal . v0`), so
/// no per-call products are needed.  Returns `None` when the ray is
/// parallel to the segment, when the crossing lies behind the origin,
/// or when it falls outside the endpoints.
///
/// `dir` need not be unit length; `dist` is then in multiples of it.
pub fn segment_ray_intersect(
    origin: Vec2,
    dir: Vec2,
    v0: Vec2,
    v1: Vec2,
    normal: Vec2,
    seg_dir: Vec2,
    plane_dist: f32,
) -> Option<SegHit> {
    let d = dir.dot(normal);
    if d == 0.0 {
        return None;
    }

    let mut dist = plane_dist - origin.dot(normal);

    // Behind the origin: the signed plane offset and the approach
    // direction must agree in sign.
    if (dist <= 0.0 && d > 0.0) || (dist > 0.0 && d <= 0.0) {
        return None;
    }
    dist /= d;

    let point = origin + dir * dist;

    let p = point.dot(seg_dir);
    let p0 = v0.dot(seg_dir);
    let p1 = v1.dot(seg_dir);

    // Endpoint projections may run in either order.
    if (p >= p0 && p <= p1) || (p <= p0 && p >= p1) {
        Some(SegHit {
            dist,
            point,
            offset: p - p0,
        })
    } else {
        None
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    // Vertical segment x=10, y in [0,20]; normal (-1,0), dir (0,1).
    const V0: Vec2 = vec2(10.0, 0.0);
    const V1: Vec2 = vec2(10.0, 20.0);
    const N: Vec2 = vec2(-1.0, 0.0);
    const SD: Vec2 = vec2(0.0, 1.0);
    // N . V0, the segment's signed plane offset.
    const PD: f32 = -10.0;

    #[test]
    fn hits_forward_crossing() {
        let hit = segment_ray_intersect(vec2(0.0, 5.0), vec2(1.0, 0.0), V0, V1, N, SD, PD)
            .expect("ray aimed at segment");
        assert!((hit.dist - 10.0).abs() < 1e-6);
        assert!((hit.point - vec2(10.0, 5.0)).length() < 1e-6);
        assert!((hit.offset - 5.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_parallel() {
        assert!(segment_ray_intersect(vec2(0.0, 5.0), vec2(0.0, 1.0), V0, V1, N, SD, PD).is_none());
    }

    #[test]
    fn rejects_behind_origin() {
        assert!(segment_ray_intersect(vec2(20.0, 5.0), vec2(1.0, 0.0), V0, V1, N, SD, PD).is_none());
    }

    #[test]
    fn rejects_outside_endpoints() {
        assert!(segment_ray_intersect(vec2(0.0, 25.0), vec2(1.0, 0.0), V0, V1, N, SD, PD).is_none());
    }

    #[test]
    fn offset_matches_reversed_endpoints() {
        // Same segment walked the other way: offset measured from v1.
        let hit = segment_ray_intersect(vec2(0.0, 5.0), vec2(1.0, 0.0), V1, V0, N, -SD, PD)
            .expect("still crosses");
        assert!((hit.offset - 15.0).abs() < 1e-6);
    }

    #[test]
    fn unnormalized_dir_scales_dist() {
        let hit = segment_ray_intersect(vec2(0.0, 5.0), vec2(2.0, 0.0), V0, V1, N, SD, PD).unwrap();
        assert!((hit.dist - 5.0).abs() < 1e-6);
        assert!((hit.point - vec2(10.0, 5.0)).length() < 1e-6);
    }
}
