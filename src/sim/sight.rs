use glam::Vec2;

use crate::geom::{locate_platform, ray_walk};
use crate::world::geometry::Level;

/// Line-of-sight between two 3-D points (2-D position plus height).
///
/// Walks the portal graph along the segment.  At every crossed edge
/// the trace's height there, expressed as a height-over-distance
/// gradient, is compared with the stricter of the two adjoining
/// ceilings and the stricter of the two floors; passing either means
/// the trace runs through solid rock.  The walk is bounded by the
/// level's edge count, so malformed geometry degrades to "blocked".
pub fn point_can_see_point(level: &Level, from: Vec2, from_h: f32, to: Vec2, to_h: f32) -> bool {
    let delta = to - from;
    let trace_dist = delta.length();
    if trace_dist == 0.0 {
        return true;
    }
    let dir = delta / trace_dist;
    let trace_grad = (to_h - from_h) / trace_dist;

    // Nudge each re-seeded origin forward so the crossing just taken
    // is behind it.
    let nudge = dir * 0.001;

    let mut platform = locate_platform(level, from);
    let mut pos = from;
    let mut dist = 0.0f32;

    for _ in 0..=level.edges.len() {
        let Some(hit) = ray_walk(level, platform, dir, pos, dist) else {
            return false;
        };
        if hit.distance > trace_dist {
            return true;
        }

        let e = level.edge(hit.edge);
        let (lp, rp) = (level.platform(e.left), level.platform(e.right));

        let ceil = lp.ceil_h.min(rp.ceil_h);
        if (ceil - from_h) / hit.distance < trace_grad {
            return false;
        }
        let floor = lp.floor_h.max(rp.floor_h);
        if (floor - from_h) / hit.distance > trace_grad {
            return false;
        }

        dist = hit.distance;
        pos = hit.pos + nudge;
        platform = hit.platform;
    }
    false
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::fixtures::two_room_level;
    use glam::vec2;

    #[test]
    fn clear_view_within_one_platform() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        assert!(point_can_see_point(
            &level,
            vec2(16.0, 64.0),
            32.0,
            vec2(100.0, 100.0),
            100.0,
        ));
    }

    #[test]
    fn clear_view_through_open_portal() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        assert!(point_can_see_point(
            &level,
            vec2(64.0, 64.0),
            64.0,
            vec2(192.0, 64.0),
            64.0,
        ));
    }

    #[test]
    fn raised_far_floor_blocks_a_low_trace() {
        // Room B's floor at 80: a flat trace at height 32 must clip it
        // at the portal.
        let level = two_room_level(0.0, 128.0, 80.0, 192.0);
        assert!(!point_can_see_point(
            &level,
            vec2(64.0, 64.0),
            32.0,
            vec2(192.0, 64.0),
            32.0,
        ));
        // Above the ledge the same trace clears.
        assert!(point_can_see_point(
            &level,
            vec2(64.0, 64.0),
            100.0,
            vec2(192.0, 64.0),
            100.0,
        ));
    }

    #[test]
    fn low_shared_ceiling_blocks_a_high_trace() {
        let level = two_room_level(0.0, 128.0, 0.0, 48.0);
        assert!(!point_can_see_point(
            &level,
            vec2(64.0, 64.0),
            64.0,
            vec2(192.0, 64.0),
            40.0,
        ));
        assert!(point_can_see_point(
            &level,
            vec2(64.0, 64.0),
            20.0,
            vec2(192.0, 64.0),
            20.0,
        ));
    }

    #[test]
    fn rising_trace_grazes_under_the_lintel() {
        // Portal ceiling at 48, crossed at half the trace length: the
        // trace from 16 to 60 passes it at 38, just clearing.
        let level = two_room_level(0.0, 128.0, 0.0, 48.0);
        assert!(point_can_see_point(
            &level,
            vec2(64.0, 64.0),
            16.0,
            vec2(192.0, 64.0),
            60.0,
        ));
    }
}
