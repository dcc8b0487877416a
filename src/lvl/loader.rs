//! Turns a parsed [`RawLevel`] into the runtime portal graph, resolving
//! texture paths through the bank as it goes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::lvl::file::{LevelError, RawLevel};
use crate::lvl::tga::{self, TgaError};
use crate::world::geometry::{Edge, Level, PLATFORM_OUTSIDE, Platform, PlatformId, Vertex};
use crate::world::texture::{
    NO_TEXTURE, Texture, TextureBank, TextureError, TextureId, TextureSource,
};

/// Wall texture applied to every edge.
const WALL_TEXTURE: &str = "wall.tga";
/// Flat texture applied to every platform's floor and ceiling.
const FLOOR_TEXTURE: &str = "floor.tga";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error(transparent)]
    Tga(#[from] TgaError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Texture resolver for on-disk assets: paths are looked up under the
/// configured root, decoded from TGA, and cached in the bank.  Any
/// failure degrades to the checkerboard fallback so a missing file
/// never takes the level down with it.
pub struct LevelAssets<'a> {
    bank: &'a mut TextureBank,
    root: PathBuf,
}

impl<'a> LevelAssets<'a> {
    pub fn new(bank: &'a mut TextureBank, root: impl Into<PathBuf>) -> Self {
        Self {
            bank,
            root: root.into(),
        }
    }

    fn load(&mut self, path: &str) -> Result<TextureId, LoadError> {
        let bytes = fs::read(self.root.join(path))?;
        let img = tga::decode(&bytes)?;
        let tex = Texture::from_rows(path, img.w, img.h, &img.rows)?;
        Ok(self.bank.insert(tex)?)
    }
}

impl TextureSource for LevelAssets<'_> {
    fn texture_from_path(&mut self, path: &str) -> TextureId {
        if let Some(id) = self.bank.id(path) {
            return id;
        }
        log::info!("loading texture {path}");
        match self.load(path) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("texture {path}: {err}; using fallback");
                NO_TEXTURE
            }
        }
    }
}

/// File platform ref to runtime id: `-1` is the outside sentinel,
/// everything else shifts up by one.
fn platform_id(raw: i32) -> PlatformId {
    if raw < 0 {
        PLATFORM_OUTSIDE
    } else {
        raw as PlatformId + 1
    }
}

/// Cross-link a parsed level into the runtime graph, validating every
/// index on the way.
pub fn build_level(
    raw: &RawLevel,
    textures: &mut dyn TextureSource,
) -> Result<Level, LevelError> {
    let wall = textures.texture_from_path(WALL_TEXTURE);
    let floor = textures.texture_from_path(FLOOR_TEXTURE);

    let check_edge_ref =
        |what: &'static str, owner: usize, index: i32| -> Result<u32, LevelError> {
            if index < 0 || index as usize >= raw.edges.len() {
                return Err(LevelError::BadRef {
                    owner,
                    what,
                    index,
                    max: raw.edges.len(),
                });
            }
            Ok(index as u32)
        };

    let mut vertices = Vec::with_capacity(raw.vertices.len());
    for (i, v) in raw.vertices.iter().enumerate() {
        let mut edges = Vec::with_capacity(v.edges.len());
        for &e in &v.edges {
            edges.push(check_edge_ref("vertex edge", i, e)?);
        }
        vertices.push(Vertex { pos: v.pos, edges });
    }

    let mut edges = Vec::with_capacity(raw.edges.len());
    for (i, e) in raw.edges.iter().enumerate() {
        for &v in &e.verts {
            if v < 0 || v as usize >= raw.vertices.len() {
                return Err(LevelError::BadRef {
                    owner: i,
                    what: "vertex",
                    index: v,
                    max: raw.vertices.len(),
                });
            }
        }
        for p in [e.left, e.right] {
            if p < -1 || (p >= 0 && p as usize >= raw.platforms.len()) {
                return Err(LevelError::BadRef {
                    owner: i,
                    what: "platform",
                    index: p,
                    max: raw.platforms.len(),
                });
            }
        }
        edges.push(Edge::between(
            raw.vertices[e.verts[0] as usize].pos,
            raw.vertices[e.verts[1] as usize].pos,
            [e.verts[0] as u32, e.verts[1] as u32],
            platform_id(e.left),
            platform_id(e.right),
            wall,
        ));
    }

    let mut platforms = Vec::with_capacity(raw.platforms.len() + 1);
    for (i, p) in std::iter::once(&raw.outside)
        .chain(raw.platforms.iter())
        .enumerate()
    {
        let id = i as PlatformId;
        let mut refs = Vec::with_capacity(p.edges.len());
        for &e in &p.edges {
            let e = check_edge_ref("platform edge", i, e)?;
            let edge = &edges[e as usize];
            if edge.left != id && edge.right != id {
                return Err(LevelError::EdgeNotOnPlatform {
                    platform: i,
                    edge: e as i32,
                });
            }
            refs.push(e);
        }
        platforms.push(Platform {
            floor_h: p.floor_h,
            ceil_h: p.ceil_h,
            edges: refs,
            texture: floor,
        });
    }

    Ok(Level {
        vertices,
        edges,
        platforms,
        size: raw.size,
    })
}

/// Overdraw trim: a platform whose floor is higher than every
/// neighbour's ceiling can never show that floor, so pull it down to
/// just above the highest neighbouring ceiling.  Symmetrically for a
/// ceiling below every neighbouring floor.
pub fn optimise_platforms(level: &mut Level) {
    let mut new_heights = vec![(None, None); level.platforms.len()];

    for (i, p) in level.platforms.iter().enumerate() {
        let id = i as PlatformId;
        let mut floor_cap: Option<f32> = None;
        let mut ceil_cap: Option<f32> = None;
        let mut change_floor = true;
        let mut change_ceil = true;

        for &e in &p.edges {
            let n = level.platform(level.edge(e).other_side(id));
            if p.floor_h > n.ceil_h {
                floor_cap = Some(floor_cap.map_or(n.ceil_h, |h| h.max(n.ceil_h)));
            } else {
                change_floor = false;
            }
            if p.ceil_h < n.floor_h {
                ceil_cap = Some(ceil_cap.map_or(n.floor_h, |h| h.min(n.floor_h)));
            } else {
                change_ceil = false;
            }
        }
        if change_floor {
            new_heights[i].0 = floor_cap.map(|h| h + 1.0);
        }
        if change_ceil {
            new_heights[i].1 = ceil_cap.map(|h| h - 1.0);
        }
    }

    for (p, (floor, ceil)) in level.platforms.iter_mut().zip(new_heights) {
        if let Some(h) = floor {
            p.floor_h = h;
        }
        if let Some(h) = ceil {
            p.ceil_h = h;
        }
    }
}

/// Read, cross-link, and optimise a level file.  Textures are resolved
/// relative to `texture_root` and end up in `bank`.
pub fn load_level(
    path: impl AsRef<Path>,
    texture_root: impl Into<PathBuf>,
    bank: &mut TextureBank,
) -> Result<Level, LoadError> {
    let bytes = fs::read(path)?;
    let raw = RawLevel::parse(bytes.as_slice())?;
    let mut assets = LevelAssets::new(bank, texture_root);
    let mut level = build_level(&raw, &mut assets)?;
    optimise_platforms(&mut level);
    log::info!(
        "level loaded: {} platforms, {} edges, {} vertices, size {}x{}",
        level.platforms.len() - 1,
        level.edges.len(),
        level.vertices.len(),
        level.size.x,
        level.size.y,
    );
    Ok(level)
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::lvl::file::{RawEdge, RawPlatform, RawVertex};
    use crate::world::fixtures::two_room_level;
    use crate::world::texture::TextureId;
    use glam::vec2;

    struct StubTextures;
    impl TextureSource for StubTextures {
        fn texture_from_path(&mut self, path: &str) -> TextureId {
            match path {
                WALL_TEXTURE => 1,
                FLOOR_TEXTURE => 2,
                _ => NO_TEXTURE,
            }
        }
    }

    fn square_raw() -> RawLevel {
        let corners = [
            vec2(0.0, 0.0),
            vec2(128.0, 0.0),
            vec2(128.0, 128.0),
            vec2(0.0, 128.0),
        ];
        RawLevel {
            edges: (0..4)
                .map(|i| RawEdge {
                    verts: [i, (i + 1) % 4],
                    left: -1,
                    right: 0,
                })
                .collect(),
            platforms: vec![RawPlatform {
                ceil_h: 96.0,
                floor_h: 8.0,
                edges: vec![0, 1, 2, 3],
            }],
            outside: RawPlatform {
                ceil_h: 0.0,
                floor_h: 0.0,
                edges: vec![0, 1, 2, 3],
            },
            vertices: corners
                .iter()
                .enumerate()
                .map(|(i, &pos)| RawVertex {
                    pos,
                    edges: vec![(i as i32 + 3) % 4, i as i32],
                })
                .collect(),
            size: vec2(128.0, 128.0),
        }
    }

    #[test]
    fn cross_links_a_square_room() {
        let level = build_level(&square_raw(), &mut StubTextures).unwrap();

        // File platform 0 became runtime platform 1; -1 became the
        // sentinel.
        assert_eq!(level.platforms.len(), 2);
        let e = level.edge(1);
        assert_eq!(e.left, PLATFORM_OUTSIDE);
        assert_eq!(e.right, 1);
        assert_eq!(e.texture, 1);
        assert_eq!(level.platform(1).texture, 2);
        assert_eq!(level.platform(1).floor_h, 8.0);

        // Derived edge vectors obey the orientation rule.
        assert!((e.dir - vec2(0.0, 1.0)).length() < 1e-6);
        assert!((e.normal - vec2(-1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn bad_vertex_ref_is_rejected() {
        let mut raw = square_raw();
        raw.edges[2].verts[1] = 9;
        let err = build_level(&raw, &mut StubTextures).unwrap_err();
        assert!(matches!(
            err,
            LevelError::BadRef {
                owner: 2,
                what: "vertex",
                index: 9,
                ..
            }
        ));
    }

    #[test]
    fn foreign_edge_in_platform_list_is_rejected() {
        let mut raw = square_raw();
        raw.edges[3].right = -1; // edge 3 no longer borders platform 0
        let err = build_level(&raw, &mut StubTextures).unwrap_err();
        assert!(matches!(
            err,
            LevelError::EdgeNotOnPlatform {
                platform: 1,
                edge: 3
            }
        ));
    }

    #[test]
    fn pillar_floor_is_pulled_down_to_its_neighbours() {
        // Room B's floor towers over both neighbours' ceilings (A at
        // 128, outside at 0): it can never be seen, so it clamps to
        // just above the highest one.
        let mut level = two_room_level(0.0, 128.0, 200.0, 300.0);
        optimise_platforms(&mut level);
        assert_eq!(level.platform(2).floor_h, 129.0);
        // Everything else is left alone.
        assert_eq!(level.platform(1).floor_h, 0.0);
        assert_eq!(level.platform(1).ceil_h, 128.0);
        assert_eq!(level.platform(2).ceil_h, 300.0);
    }

    #[test]
    fn sunken_ceiling_is_pulled_up() {
        let mut level = two_room_level(64.0, 192.0, -100.0, -50.0);
        optimise_platforms(&mut level);
        // B's ceiling at -50 is below A's floor (64) and the outside
        // floor (0): lowest neighbouring floor is 0.
        assert_eq!(level.platform(2).ceil_h, -1.0);
        assert_eq!(level.platform(2).floor_h, -100.0);
    }

    #[test]
    fn ordinary_rooms_are_untouched() {
        let mut level = two_room_level(0.0, 128.0, 32.0, 160.0);
        let before: Vec<(f32, f32)> = level
            .platforms
            .iter()
            .map(|p| (p.floor_h, p.ceil_h))
            .collect();
        optimise_platforms(&mut level);
        let after: Vec<(f32, f32)> = level
            .platforms
            .iter()
            .map(|p| (p.floor_h, p.ceil_h))
            .collect();
        assert_eq!(before, after);
    }
}
