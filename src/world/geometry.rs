use glam::Vec2;

use crate::world::texture::TextureId;

pub type VertexId = u32;
pub type EdgeId = u32;
pub type PlatformId = u32;

/// Sentinel platform standing for "outside the map".  Always index 0;
/// real platforms start at 1.  A ray reaching it has either escaped a
/// malformed level or hit a true map boundary.
pub const PLATFORM_OUTSIDE: PlatformId = 0;

/// Runtime snapshot of one level (immutable after load).
#[derive(Debug)]
pub struct Level {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    /// `platforms[0]` is the outside sentinel.
    pub platforms: Vec<Platform>,
    pub size: Vec2,
}

/*--------------------------- vertices -------------------------------*/

#[derive(Clone, Debug)]
pub struct Vertex {
    pub pos: Vec2,
    /// Incident edges, filled at load time for adjacency queries.
    pub edges: Vec<EdgeId>,
}

/*---------------------------- edges ---------------------------------*/

/// Boundary segment between exactly two platforms.
///
/// `normal` is `dir` rotated 90° and points from the `left` platform
/// toward the `right` one; every sidedness test in the engine relies on
/// that orientation being fixed at load time.
#[derive(Clone, Debug)]
pub struct Edge {
    pub verts: [VertexId; 2],
    pub left: PlatformId,
    pub right: PlatformId,
    pub dir: Vec2,
    pub normal: Vec2,
    /// `normal · verts[0]`, the half-plane offset used by the
    /// intersection kernel.
    pub plane_dist: f32,
    pub texture: TextureId,
}

impl Edge {
    /// Build an edge with its derived vectors from the two endpoint
    /// positions.
    pub fn between(
        p0: Vec2,
        p1: Vec2,
        verts: [VertexId; 2],
        left: PlatformId,
        right: PlatformId,
        texture: TextureId,
    ) -> Self {
        let dir = (p1 - p0).normalize();
        let normal = dir.perp();
        Self {
            verts,
            left,
            right,
            dir,
            normal,
            plane_dist: normal.dot(p0),
            texture,
        }
    }

    /// The platform on the other side of this edge from `p`.
    #[inline]
    pub fn other_side(&self, p: PlatformId) -> PlatformId {
        if self.left == p { self.right } else { self.left }
    }
}

/*--------------------------- platforms ------------------------------*/

/// A cell of the planar subdivision: its own floor and ceiling height
/// plus the set of edges bounding it (order irrelevant).
#[derive(Clone, Debug)]
pub struct Platform {
    pub floor_h: f32,
    pub ceil_h: f32,
    pub edges: Vec<EdgeId>,
    pub texture: TextureId,
}

/*----------------------------- level --------------------------------*/

impl Level {
    #[inline]
    pub fn platform(&self, id: PlatformId) -> &Platform {
        &self.platforms[id as usize]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    /// Endpoint positions of `edge`, in vertex order.
    #[inline]
    pub fn edge_points(&self, edge: &Edge) -> (Vec2, Vec2) {
        (
            self.vertices[edge.verts[0] as usize].pos,
            self.vertices[edge.verts[1] as usize].pos,
        )
    }

    #[inline]
    pub fn is_outside(&self, id: PlatformId) -> bool {
        id == PLATFORM_OUTSIDE
    }

    /// Ids of the real (non-sentinel) platforms.
    pub fn platform_ids(&self) -> impl Iterator<Item = PlatformId> + '_ {
        1..self.platforms.len() as PlatformId
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
