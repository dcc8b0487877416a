//! On-disk level format.
//!
//! The file is a packed little-endian dump: a fixed header followed by
//! the edge table, the platform records (each with its edge-ref list
//! inline), the outside platform's edge refs, and finally the vertex
//! records (again with inline edge refs).  Every count field is an
//! `i32` padded to eight bytes by a dummy word.

use std::io::{self, Read};

use byteorder::{LittleEndian as LE, ReadBytesExt};
use glam::{Vec2, vec2};

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("negative count {count} for {what}")]
    BadCount { what: &'static str, count: i32 },

    #[error("record {owner} references {what} {index} (max {max})")]
    BadRef {
        owner: usize,
        what: &'static str,
        index: i32,
        max: usize,
    },

    #[error("platform {platform} lists edge {edge} which does not border it")]
    EdgeNotOnPlatform { platform: usize, edge: i32 },
}

/// Edge record: two vertex refs and the two bordering platforms.
/// `-1` on either side means the outside platform.
#[derive(Clone, Copy, Debug)]
pub struct RawEdge {
    pub verts: [i32; 2],
    pub left: i32,
    pub right: i32,
}

#[derive(Clone, Debug)]
pub struct RawPlatform {
    pub ceil_h: f32,
    pub floor_h: f32,
    pub edges: Vec<i32>,
}

#[derive(Clone, Debug)]
pub struct RawVertex {
    pub pos: Vec2,
    pub edges: Vec<i32>,
}

/// A level file parsed but not yet cross-linked.
#[derive(Debug)]
pub struct RawLevel {
    pub edges: Vec<RawEdge>,
    pub platforms: Vec<RawPlatform>,
    /// The unbounded platform surrounding the map.
    pub outside: RawPlatform,
    pub vertices: Vec<RawVertex>,
    pub size: Vec2,
}

fn read_count(r: &mut impl Read, what: &'static str) -> Result<usize, LevelError> {
    let count = r.read_i32::<LE>()?;
    r.read_u32::<LE>()?; // padding
    if count < 0 {
        return Err(LevelError::BadCount { what, count });
    }
    Ok(count as usize)
}

fn read_refs(r: &mut impl Read, n: usize) -> Result<Vec<i32>, LevelError> {
    let mut refs = vec![0i32; n];
    r.read_i32_into::<LE>(&mut refs)?;
    Ok(refs)
}

/// Platform header without its edge refs (the outside platform's refs
/// are stored apart from its header).
fn read_platform_header(r: &mut impl Read) -> Result<(f32, f32, usize), LevelError> {
    let ceil_h = r.read_f32::<LE>()?;
    let floor_h = r.read_f32::<LE>()?;
    let n = read_count(r, "platform edges")?;
    Ok((ceil_h, floor_h, n))
}

impl RawLevel {
    pub fn parse(mut r: impl Read) -> Result<Self, LevelError> {
        let numedges = read_count(&mut r, "edges")?;
        let numplatforms = read_count(&mut r, "platforms")?;
        let outside_header = read_platform_header(&mut r)?;
        let numverts = read_count(&mut r, "vertices")?;
        let size = vec2(r.read_f32::<LE>()?, r.read_f32::<LE>()?);

        let mut edges = Vec::with_capacity(numedges);
        for _ in 0..numedges {
            edges.push(RawEdge {
                verts: [r.read_i32::<LE>()?, r.read_i32::<LE>()?],
                left: r.read_i32::<LE>()?,
                right: r.read_i32::<LE>()?,
            });
        }

        let mut platforms = Vec::with_capacity(numplatforms);
        for _ in 0..numplatforms {
            let (ceil_h, floor_h, n) = read_platform_header(&mut r)?;
            platforms.push(RawPlatform {
                ceil_h,
                floor_h,
                edges: read_refs(&mut r, n)?,
            });
        }

        let outside = RawPlatform {
            ceil_h: outside_header.0,
            floor_h: outside_header.1,
            edges: read_refs(&mut r, outside_header.2)?,
        };

        let mut vertices = Vec::with_capacity(numverts);
        for _ in 0..numverts {
            let pos = vec2(r.read_f32::<LE>()?, r.read_f32::<LE>()?);
            let n = read_count(&mut r, "vertex edges")?;
            vertices.push(RawVertex {
                pos,
                edges: read_refs(&mut r, n)?,
            });
        }

        Ok(Self {
            edges,
            platforms,
            outside,
            vertices,
            size,
        })
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
