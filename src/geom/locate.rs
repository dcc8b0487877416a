use std::f32::consts::PI;

use glam::Vec2;

use crate::world::geometry::{Level, PLATFORM_OUTSIDE, PlatformId};

fn wrap_pi(mut a: f32) -> f32 {
    while a < -PI {
        a += 2.0 * PI;
    }
    while a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Winding-angle inside test, robust to non-convex platforms.
///
/// Sums the signed angle subtended at `p` by every boundary edge.  The
/// sign depends on which side of the edge the platform lies, so for a
/// point inside the contributions add up to a full turn; for a point
/// outside they cancel.
pub fn platform_contains(level: &Level, id: PlatformId, p: Vec2) -> bool {
    let mut total = 0.0f32;
    for &eid in &level.platform(id).edges {
        let e = level.edge(eid);
        let (v0, v1) = level.edge_points(e);
        let a = v0 - p;
        let b = v1 - p;
        let angle = wrap_pi(b.x.atan2(b.y) - a.x.atan2(a.y));
        if e.left == id {
            total += angle;
        } else if e.right == id {
            total -= angle;
        } else {
            log::error!("edge {eid} not associated with platform {id}");
        }
    }
    total > PI
}

/// Find the platform containing `p` by scanning all real platforms.
///
/// Falls back to the outside sentinel when no platform contains the
/// point; that is always suspicious for spawn points and view origins,
/// so it is logged.
pub fn locate_platform(level: &Level, p: Vec2) -> PlatformId {
    for id in level.platform_ids() {
        if platform_contains(level, id, p) {
            return id;
        }
    }
    log::warn!("point {p} is outside every platform");
    PLATFORM_OUTSIDE
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
