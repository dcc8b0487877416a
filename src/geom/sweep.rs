use glam::Vec2;

use crate::geom::intersect::segment_ray_intersect;
use crate::world::geometry::{EdgeId, Level, PlatformId};

/// Whether a swept disc is crossing into or out of the platform that
/// owns the edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossingKind {
    Entry,
    Leaving,
}

/// Nearest boundary contact of a swept disc.
#[derive(Clone, Copy, Debug)]
pub struct SolidHit {
    pub edge: EdgeId,
    /// For an entry, the neighbouring platform the disc starts to
    /// overlap; for a leave, the platform left behind.
    pub platform: PlatformId,
    pub distance: f32,
    pub kind: CrossingKind,
}

/// Sweep a disc of `radius` along `dir` against every edge of the
/// candidate platforms, each edge inflated by `radius` both ways along
/// its normal.  Returns the nearest crossing, classified as entering
/// or leaving the platform under test.
///
/// Broad-phase primitive: the sliding movement code currently treats
/// movers as zero-radius rays, so this only feeds queries that want an
/// early out for disc-shaped colliders.
pub fn cylinder_sweep(
    level: &Level,
    platforms: &[PlatformId],
    dir: Vec2,
    origin: Vec2,
    radius: f32,
) -> Option<SolidHit> {
    let mut best: Option<SolidHit> = None;

    for &pid in platforms {
        for &eid in &level.platform(pid).edges {
            let e = level.edge(eid);
            let (v0, v1) = level.edge_points(e);
            let push = e.normal * radius;

            // Face shifted toward the right platform.
            if let Some(hit) = segment_ray_intersect(
                origin,
                dir,
                v0 + push,
                v1 + push,
                e.normal,
                e.dir,
                e.plane_dist + radius,
            )
                && best.is_none_or(|b| hit.dist < b.distance)
            {
                best = Some(SolidHit {
                    edge: eid,
                    platform: e.left,
                    distance: hit.dist,
                    kind: if e.right != pid {
                        CrossingKind::Leaving
                    } else {
                        CrossingKind::Entry
                    },
                });
            }

            // Face shifted toward the left platform.
            if let Some(hit) = segment_ray_intersect(
                origin,
                dir,
                v0 - push,
                v1 - push,
                e.normal,
                e.dir,
                e.plane_dist - radius,
            )
                && best.is_none_or(|b| hit.dist < b.distance)
            {
                best = Some(SolidHit {
                    edge: eid,
                    platform: e.right,
                    distance: hit.dist,
                    kind: if e.right == pid {
                        CrossingKind::Leaving
                    } else {
                        CrossingKind::Entry
                    },
                });
            }
        }
    }
    best
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
