use glam::Vec2;
use smallvec::SmallVec;

use crate::geom::intersect::segment_ray_intersect;
use crate::world::geometry::{EdgeId, Level, PlatformId};

/// One crossing produced by the ray walk: where the ray left the
/// current platform and which platform it entered.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub pos: Vec2,
    pub edge: EdgeId,
    /// Platform on the far side of `edge`.
    pub platform: PlatformId,
    /// Cumulative distance from the original ray origin.
    pub distance: f32,
    /// Horizontal texture coordinate along the crossed edge.
    pub tex_offset: f32,
}

/// Edges already crossed during one outward sweep.  Sized for typical
/// column depths; spills to the heap for pathological levels.
pub type EdgeCache = SmallVec<[EdgeId; 16]>;

/// Find the nearest forward boundary crossing out of `platform`.
///
/// Scans the platform's edges, keeping the minimal positive crossing
/// distance.  An edge is skipped when the ray approaches it from the
/// back face, which guards against re-crossing the boundary the ray
/// just came through.  Returns `None` (and logs) when no edge is
/// crossed at all - the caller abandons that column or movement step.
pub fn ray_walk(
    level: &Level,
    platform: PlatformId,
    dir: Vec2,
    origin: Vec2,
    dist_so_far: f32,
) -> Option<Intersection> {
    walk_filtered(level, platform, dir, origin, dist_so_far, |_| true)
}

/// As [`ray_walk`], but skips edges already in `visited` and records
/// the winning edge there.  An outward sweep through the graph can
/// then never cross the same edge twice, which both bounds the sweep
/// by the level's edge count and keeps crossing distances strictly
/// increasing.
pub fn ray_walk_cached(
    level: &Level,
    platform: PlatformId,
    dir: Vec2,
    origin: Vec2,
    dist_so_far: f32,
    visited: &mut EdgeCache,
) -> Option<Intersection> {
    let hit = walk_filtered(level, platform, dir, origin, dist_so_far, |id| {
        !visited.contains(&id)
    })?;
    visited.push(hit.edge);
    Some(hit)
}

fn walk_filtered(
    level: &Level,
    platform: PlatformId,
    dir: Vec2,
    origin: Vec2,
    dist_so_far: f32,
    mut admit: impl FnMut(EdgeId) -> bool,
) -> Option<Intersection> {
    let mut best: Option<Intersection> = None;

    for &id in &level.platform(platform).edges {
        if !admit(id) {
            continue;
        }
        let e = level.edge(id);
        let (v0, v1) = level.edge_points(e);

        let Some(hit) = segment_ray_intersect(origin, dir, v0, v1, e.normal, e.dir, e.plane_dist)
        else {
            continue;
        };

        // Which platform would we enter, and is this actually the
        // front face for that direction of travel?
        let next = if e.left != platform {
            if e.normal.dot(dir) > 0.0 {
                continue;
            }
            e.left
        } else if e.right != platform {
            if e.normal.dot(dir) < 0.0 {
                continue;
            }
            e.right
        } else {
            log::error!("edge {id} lists platform {platform} on both sides");
            continue;
        };

        if best.is_some_and(|b| hit.dist >= b.distance - dist_so_far) {
            continue;
        }
        best = Some(Intersection {
            pos: hit.point,
            edge: id,
            platform: next,
            distance: hit.dist + dist_so_far,
            tex_offset: hit.offset,
        });
    }

    if best.is_none() {
        log::warn!(
            "ray walk found no crossing out of platform {platform} \
             (origin {origin}, dir {dir})"
        );
    }
    best
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PLATFORM_OUTSIDE;
    use crate::world::fixtures::two_room_level;
    use glam::vec2;

    #[test]
    fn crosses_shared_edge_into_neighbour() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        let hit = ray_walk(&level, 1, vec2(1.0, 0.0), vec2(64.0, 64.0), 0.0).unwrap();
        assert_eq!(hit.edge, 1);
        assert_eq!(hit.platform, 2);
        assert!((hit.distance - 64.0).abs() < 1e-5);
        assert!((hit.pos - vec2(128.0, 64.0)).length() < 1e-5);
        // Shared edge runs (128,0) -> (128,128): offset is the y hit.
        assert!((hit.tex_offset - 64.0).abs() < 1e-5);
    }

    #[test]
    fn exits_to_outside_at_map_boundary() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        let hit = ray_walk(&level, 1, vec2(-1.0, 0.0), vec2(64.0, 64.0), 0.0).unwrap();
        assert_eq!(hit.platform, PLATFORM_OUTSIDE);
        assert!((hit.distance - 64.0).abs() < 1e-5);
    }

    #[test]
    fn distances_increase_across_steps() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        let dir = vec2(1.0, 0.0);
        let first = ray_walk(&level, 1, dir, vec2(64.0, 64.0), 0.0).unwrap();
        let second = ray_walk(&level, first.platform, dir, first.pos, first.distance).unwrap();
        assert!(second.distance > first.distance);
        assert_eq!(second.platform, PLATFORM_OUTSIDE);
        assert!((second.distance - 192.0).abs() < 1e-4);
    }

    #[test]
    fn cached_walk_never_revisits_an_edge() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        let dir = vec2(1.0, 0.2).normalize();
        let mut visited = EdgeCache::new();

        let mut platform = 1;
        let mut origin = vec2(64.0, 64.0);
        let mut dist = 0.0;
        let mut crossed = Vec::new();
        while platform != PLATFORM_OUTSIDE {
            let hit = ray_walk_cached(&level, platform, dir, origin, dist, &mut visited).unwrap();
            assert!(hit.distance > dist);
            crossed.push(hit.edge);
            platform = hit.platform;
            origin = hit.pos;
            dist = hit.distance;
        }
        let mut dedup = crossed.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), crossed.len());
    }

    #[test]
    fn no_crossing_reports_failure() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        // A zero direction is parallel to every edge.
        assert!(ray_walk(&level, 1, vec2(0.0, 0.0), vec2(64.0, 64.0), 0.0).is_none());
    }
}
