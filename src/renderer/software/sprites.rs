//! Per-frame sprite bookkeeping.
//!
//! Sprites are billboards rebuilt from the entity list every frame.
//! Each one is a world-space line segment with a vertical extent; it
//! registers itself on every platform its segment spans so a column
//! trace passing through any of those platforms can pick it up.

use glam::Vec2;
use smallvec::SmallVec;

use crate::geom::{locate_platform, ray_walk};
use crate::world::geometry::{Level, PlatformId};
use crate::world::texture::TextureId;

pub type SpriteId = u32;

/// Which surface a sprite's vertical offset is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachSurface {
    /// `vdist` above the highest floor the sprite spans.
    Floor,
    /// `vdist` below the lowest ceiling the sprite spans.
    Ceiling,
    /// `vdist` is an absolute world height.
    None,
}

#[derive(Clone, Copy, Debug)]
pub struct Sprite {
    pub verts: [Vec2; 2],
    /// Unit direction from `verts[0]` to `verts[1]`.
    pub dir: Vec2,
    pub normal: Vec2,
    /// `normal . verts[0]`, for the ray intersection.
    pub plane_dist: f32,
    pub h_lo: f32,
    pub h_hi: f32,
    pub texture: TextureId,
}

/// One frame's worth of sprites plus their platform registrations.
/// Owned by the caller and cleared between frames; the renderer only
/// reads it.
pub struct SpriteFrame {
    sprites: Vec<Sprite>,
    by_platform: Vec<SmallVec<[SpriteId; 4]>>,
}

impl SpriteFrame {
    pub fn for_level(level: &Level) -> Self {
        Self {
            sprites: Vec::new(),
            by_platform: vec![SmallVec::new(); level.platforms.len()],
        }
    }

    /// Drop all sprites and registrations, keeping allocations.
    pub fn clear(&mut self) {
        self.sprites.clear();
        for list in &mut self.by_platform {
            list.clear();
        }
    }

    #[inline]
    pub fn sprite(&self, id: SpriteId) -> &Sprite {
        &self.sprites[id as usize]
    }

    #[inline]
    pub fn on_platform(&self, id: PlatformId) -> &[SpriteId] {
        &self.by_platform[id as usize]
    }

    /// Register a billboard spanning the segment `verts`, `height`
    /// units tall, anchored `vdist` from `surface`.
    ///
    /// Walks the portal graph along the segment so the sprite is
    /// registered on every platform it crosses; a sprite straddling a
    /// portal must be considered by columns tracing either room.
    pub fn add_sprite(
        &mut self,
        level: &Level,
        verts: [Vec2; 2],
        height: f32,
        vdist: f32,
        surface: AttachSurface,
        texture: TextureId,
    ) -> SpriteId {
        let id = self.sprites.len() as SpriteId;

        let span = verts[1] - verts[0];
        let width = span.length();
        let dir = span / width;

        let mut platform = locate_platform(level, verts[0]);
        let mut pos = verts[0];
        let mut dist = 0.0f32;
        let mut anchor: Option<f32> = None;

        loop {
            let list = &mut self.by_platform[platform as usize];
            if !list.contains(&id) {
                list.push(id);
            }

            let p = level.platform(platform);
            match surface {
                AttachSurface::Floor => {
                    anchor = Some(anchor.map_or(p.floor_h, |a| a.max(p.floor_h)));
                }
                AttachSurface::Ceiling => {
                    anchor = Some(anchor.map_or(p.ceil_h, |a| a.min(p.ceil_h)));
                }
                AttachSurface::None => {}
            }

            if level.is_outside(platform) {
                log::warn!("sprite segment reaches the outside platform");
                break;
            }
            let Some(hit) = ray_walk(level, platform, dir, pos, dist) else {
                break;
            };
            if hit.distance > width {
                // The sprite ends in this platform.
                break;
            }
            dist = hit.distance;
            pos = hit.pos;
            platform = hit.platform;
        }

        let (h_lo, h_hi) = match surface {
            AttachSurface::Floor => {
                let base = anchor.unwrap_or(0.0) + vdist;
                (base, base + height)
            }
            AttachSurface::Ceiling => {
                let top = anchor.unwrap_or(0.0) - vdist;
                (top - height, top)
            }
            AttachSurface::None => (vdist, vdist + height),
        };

        let normal = dir.perp();
        self.sprites.push(Sprite {
            verts,
            dir,
            normal,
            plane_dist: normal.dot(verts[0]),
            h_lo,
            h_hi,
            texture,
        });
        id
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
