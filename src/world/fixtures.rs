//! Hand-built levels for unit tests.  All geometry uses the load-time
//! orientation rule: an edge's normal points from its left platform to
//! its right platform, so a platform's boundary edges have their
//! normals pointing inward when the platform is on the right side.

use glam::{Vec2, vec2};

use crate::world::geometry::{Edge, Level, PLATFORM_OUTSIDE, Platform, Vertex};
use crate::world::texture::NO_TEXTURE;

fn vertex(x: f32, y: f32, edges: &[u32]) -> Vertex {
    Vertex {
        pos: vec2(x, y),
        edges: edges.to_vec(),
    }
}

fn platform(floor_h: f32, ceil_h: f32, edges: &[u32]) -> Platform {
    Platform {
        floor_h,
        ceil_h,
        edges: edges.to_vec(),
        texture: NO_TEXTURE,
    }
}

/// Two square rooms sharing one portal edge:
///
/// ```text
///   (0,128)      (128,128)     (256,128)
///      3------------2-------------5
///      |            |             |
///      |  A (id 1)  |  B (id 2)   |
///      |            |             |
///      0------------1-------------4
///   (0,0)        (128,0)       (256,0)
/// ```
///
/// The shared edge runs (128,0) -> (128,128); its normal is (-1,0), so
/// A is its right platform and B its left.
pub fn two_room_level(floor_a: f32, ceil_a: f32, floor_b: f32, ceil_b: f32) -> Level {
    let p: [Vec2; 6] = [
        vec2(0.0, 0.0),
        vec2(128.0, 0.0),
        vec2(128.0, 128.0),
        vec2(0.0, 128.0),
        vec2(256.0, 0.0),
        vec2(256.0, 128.0),
    ];

    let edges = vec![
        // 0: A bottom
        Edge::between(p[0], p[1], [0, 1], PLATFORM_OUTSIDE, 1, NO_TEXTURE),
        // 1: shared portal, A right / B left
        Edge::between(p[1], p[2], [1, 2], 2, 1, NO_TEXTURE),
        // 2: A top
        Edge::between(p[2], p[3], [2, 3], PLATFORM_OUTSIDE, 1, NO_TEXTURE),
        // 3: A west
        Edge::between(p[3], p[0], [3, 0], PLATFORM_OUTSIDE, 1, NO_TEXTURE),
        // 4: B bottom
        Edge::between(p[1], p[4], [1, 4], PLATFORM_OUTSIDE, 2, NO_TEXTURE),
        // 5: B east
        Edge::between(p[4], p[5], [4, 5], PLATFORM_OUTSIDE, 2, NO_TEXTURE),
        // 6: B top
        Edge::between(p[5], p[2], [5, 2], PLATFORM_OUTSIDE, 2, NO_TEXTURE),
    ];

    let vertices = vec![
        vertex(0.0, 0.0, &[0, 3]),
        vertex(128.0, 0.0, &[0, 1, 4]),
        vertex(128.0, 128.0, &[1, 2, 6]),
        vertex(0.0, 128.0, &[2, 3]),
        vertex(256.0, 0.0, &[4, 5]),
        vertex(256.0, 128.0, &[5, 6]),
    ];

    let platforms = vec![
        // outside sentinel
        platform(0.0, 0.0, &[0, 2, 3, 4, 5, 6]),
        platform(floor_a, ceil_a, &[0, 1, 2, 3]),
        platform(floor_b, ceil_b, &[1, 4, 5, 6]),
    ];

    Level {
        vertices,
        edges,
        platforms,
        size: vec2(256.0, 128.0),
    }
}

/// [`two_room_level`] scaled by two: A = [0,256]^2, B = [256,512] x
/// [0,256], same ids and edge layout.  Big enough for traces longer
/// than any engagement range.
pub fn long_two_room_level(floor_a: f32, ceil_a: f32, floor_b: f32, ceil_b: f32) -> Level {
    let mut level = two_room_level(floor_a, ceil_a, floor_b, ceil_b);
    for v in &mut level.vertices {
        v.pos *= 2.0;
    }
    for e in &mut level.edges {
        // Direction and normal are scale-invariant; only the plane
        // offset moves.
        e.plane_dist *= 2.0;
    }
    level.size *= 2.0;
    level
}

/// Single closed square room, platform id 1, [0,128] x [0,128].
pub fn one_room_level(floor_h: f32, ceil_h: f32) -> Level {
    let p: [Vec2; 4] = [
        vec2(0.0, 0.0),
        vec2(128.0, 0.0),
        vec2(128.0, 128.0),
        vec2(0.0, 128.0),
    ];

    let edges = vec![
        Edge::between(p[0], p[1], [0, 1], PLATFORM_OUTSIDE, 1, NO_TEXTURE),
        Edge::between(p[1], p[2], [1, 2], PLATFORM_OUTSIDE, 1, NO_TEXTURE),
        Edge::between(p[2], p[3], [2, 3], PLATFORM_OUTSIDE, 1, NO_TEXTURE),
        Edge::between(p[3], p[0], [3, 0], PLATFORM_OUTSIDE, 1, NO_TEXTURE),
    ];

    let vertices = vec![
        vertex(0.0, 0.0, &[0, 3]),
        vertex(128.0, 0.0, &[0, 1]),
        vertex(128.0, 128.0, &[1, 2]),
        vertex(0.0, 128.0, &[2, 3]),
    ];

    let platforms = vec![
        platform(0.0, 0.0, &[0, 1, 2, 3]),
        platform(floor_h, ceil_h, &[0, 1, 2, 3]),
    ];

    Level {
        vertices,
        edges,
        platforms,
        size: vec2(128.0, 128.0),
    }
}
